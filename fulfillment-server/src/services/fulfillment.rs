//! Order acceptance and cancellation
//!
//! Accepting an order deducts every line from the ordering pharmacy. Lines
//! the pharmacy cannot cover are topped up first by pulling the deficit from
//! the nearest pharmacy that holds it; each such transfer is stored as an
//! accepted request linked to the order line. Everything happens in one
//! transaction: any failure leaves stock, requests and status untouched.
//!
//! When no pharmacy can supply a deficit the order is canceled instead and
//! the caller gets the canceled status back rather than an error.
//!
//! Canceling a processed order puts every consumed unit back and returns
//! each transferred deficit to the pharmacy it came from.

use std::collections::HashMap;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    MutationRequestStatus, MutationType, Order, OrderAction, OrderTransitionResult, Pharmacy,
};
use sqlx::SqlitePool;

use crate::db::repository::stock_mutation_request::{self as requests, NewRequest};
use crate::db::repository::order::{self, OrderLineStock};
use crate::db::repository::{RepoError, Tx, pharmacy, proximity};
use crate::error::{ServiceError, ServiceResult};
use crate::services::inventory::apply_mutation;
use crate::services::order_status;
use crate::services::stock_transfer::move_stock;

/// Status log description written when acceptance finds no supplier
pub const NO_PHARMACY_DESCRIPTION: &str = "no pharmacies available with the requested stock";

/// Run `action` against an order
pub async fn perform(
    pool: &SqlitePool,
    radius_km: f64,
    order_id: i64,
    action: OrderAction,
    description: Option<&str>,
) -> ServiceResult<OrderTransitionResult> {
    match action {
        OrderAction::Confirm => accept_order(pool, radius_km, order_id, description).await,
        OrderAction::Cancel => cancel_order(pool, order_id, description).await,
        OrderAction::Reject | OrderAction::Ship | OrderAction::Receive => {
            order_status::transition(pool, order_id, action, description).await
        }
    }
}

/// Waiting → Processed with stock deduction and automatic transfers
pub async fn accept_order(
    pool: &SqlitePool,
    radius_km: f64,
    order_id: i64,
    description: Option<&str>,
) -> ServiceResult<OrderTransitionResult> {
    let mut tx = pool.begin().await?;
    let order = order_status::begin(&mut tx, order_id, OrderAction::Confirm).await?;

    match fulfil(&mut tx, &order, radius_km).await {
        Ok(transfers) => {
            let log = order_status::finish(&mut tx, order_id, OrderAction::Confirm, description)
                .await?;
            tx.commit().await?;
            tracing::info!(order_id, transfers, "Order accepted");
            Ok(OrderTransitionResult {
                order_id,
                status: log.status,
                description: log.description,
                transfers,
            })
        }
        Err(e) if e.code() == Some(ErrorCode::NoPharmacyToStockTransfer) => {
            tx.rollback().await?;
            tracing::warn!(order_id, error = %e, "No supplier for order, canceling");
            order_status::transition(
                pool,
                order_id,
                OrderAction::Reject,
                Some(NO_PHARMACY_DESCRIPTION),
            )
            .await
        }
        Err(e) => Err(e),
    }
}

/// Deduct every line, transferring deficits first; returns the transfer count
async fn fulfil(tx: &mut Tx<'_>, order: &Order, radius_km: f64) -> ServiceResult<usize> {
    let lines = order::find_lines_with_stock(&mut **tx, order.id, order.pharmacy_id).await?;
    if lines.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty)
            .with_detail("order_id", order.id)
            .into());
    }

    // Lines for the same product draw on one shared balance
    let mut remaining: HashMap<i64, i64> = HashMap::new();
    let mut doable = Vec::with_capacity(lines.len());
    let mut short = Vec::new();
    for line in &lines {
        let (Some(pharmacy_product_id), Some(stock)) = (line.pharmacy_product_id, line.stock)
        else {
            return Err(AppError::new(ErrorCode::PharmacyProductNotFound)
                .with_detail("pharmacy_id", order.pharmacy_id)
                .with_detail("product_id", line.product_id)
                .into());
        };
        let available = remaining.entry(pharmacy_product_id).or_insert(stock.max(0));
        if *available >= line.quantity {
            *available -= line.quantity;
            doable.push((line, pharmacy_product_id, line.quantity));
        } else {
            short.push((line, pharmacy_product_id, *available));
            *available = 0;
        }
    }

    if !short.is_empty() {
        let home = pharmacy::find_pharmacy(&mut **tx, order.pharmacy_id)
            .await?
            .ok_or_else(|| {
                AppError::new(ErrorCode::PharmacyNotFound).with_detail("pharmacy_id", order.pharmacy_id)
            })?;
        for (line, pharmacy_product_id, available) in &short {
            transfer_deficit(tx, order.id, &home, line, *pharmacy_product_id, *available, radius_km)
                .await?;
        }
    }

    for (_, pharmacy_product_id, quantity) in &doable {
        apply_mutation(tx, *pharmacy_product_id, MutationType::Reduction, *quantity).await?;
    }

    Ok(short.len())
}

/// Pull a line's deficit from the nearest supplier, then consume the line
async fn transfer_deficit(
    tx: &mut Tx<'_>,
    order_id: i64,
    home: &Pharmacy,
    line: &OrderLineStock,
    pharmacy_product_id: i64,
    available: i64,
    radius_km: f64,
) -> ServiceResult<()> {
    let deficit = line.quantity - available;
    let supplier = proximity::find_nearest_with_stock(
        &mut **tx,
        home,
        line.product_id,
        deficit,
        radius_km,
    )
    .await
    .map_err(|e| match e {
        RepoError::NotFound(_) => AppError::new(ErrorCode::NoPharmacyToStockTransfer)
            .with_detail("product_id", line.product_id)
            .with_detail("required", deficit)
            .into(),
        other => ServiceError::from(other),
    })?;
    let supplier_id = supplier.pharmacy_product.id;

    move_stock(tx, supplier_id, pharmacy_product_id, deficit).await?;
    apply_mutation(tx, pharmacy_product_id, MutationType::Reduction, line.quantity).await?;
    requests::insert(
        &mut **tx,
        NewRequest {
            origin_pharmacy_product_id: supplier_id,
            destination_pharmacy_product_id: pharmacy_product_id,
            stock: deficit,
            status: MutationRequestStatus::Accepted,
            order_detail_id: Some(line.order_detail_id),
        },
    )
    .await?;

    tracing::debug!(
        order_id,
        order_detail_id = line.order_detail_id,
        supplier = supplier_id,
        distance_km = supplier.distance_km,
        deficit,
        "Transferred deficit for order line"
    );
    Ok(())
}

/// Processed → CanceledByPharmacy, restoring stock exactly
pub async fn cancel_order(
    pool: &SqlitePool,
    order_id: i64,
    description: Option<&str>,
) -> ServiceResult<OrderTransitionResult> {
    let mut tx = pool.begin().await?;
    let order = order_status::begin(&mut tx, order_id, OrderAction::Cancel).await?;
    let lines = order::find_lines_with_stock(&mut *tx, order.id, order.pharmacy_id).await?;

    let mut transfers = 0;
    for line in &lines {
        let transfer = requests::find_accepted_by_order_detail(&mut *tx, line.order_detail_id).await?;
        let destination = match (&transfer, line.pharmacy_product_id) {
            (Some(t), _) => t.destination_pharmacy_product_id,
            (None, Some(id)) => id,
            (None, None) => {
                return Err(AppError::new(ErrorCode::PharmacyProductNotFound)
                    .with_detail("pharmacy_id", order.pharmacy_id)
                    .with_detail("product_id", line.product_id)
                    .into());
            }
        };

        apply_mutation(&mut tx, destination, MutationType::Addition, line.quantity).await?;
        if let Some(t) = transfer {
            move_stock(
                &mut tx,
                t.destination_pharmacy_product_id,
                t.origin_pharmacy_product_id,
                t.stock,
            )
            .await?;
            transfers += 1;
        }
    }

    let log = order_status::finish(&mut tx, order_id, OrderAction::Cancel, description).await?;
    tx.commit().await?;

    tracing::info!(order_id, transfers, "Order canceled, stock restored");
    Ok(OrderTransitionResult {
        order_id,
        status: log.status,
        description: log.description,
        transfers,
    })
}
