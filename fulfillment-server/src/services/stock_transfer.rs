//! Inter-pharmacy stock transfers
//!
//! A transfer is two ledger rows written in one transaction: a reduction at
//! the origin and an addition at the destination. Manual transfers go
//! through a request that the origin pharmacy approves or rejects; order
//! acceptance records its automatic transfers as already accepted requests.

use shared::error::{AppError, ErrorCode};
use shared::models::{
    MutationRequestStatus, MutationType, StockMutationRequest, StockMutationRequestCreate,
};
use sqlx::SqlitePool;

use crate::db::repository::stock_mutation_request::{self as requests, NewRequest};
use crate::db::repository::{Tx, page_bounds, pharmacy};
use crate::error::ServiceResult;
use crate::services::inventory::{apply_mutation, pharmacy_product_not_found};

fn request_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::MutationRequestNotFound).with_detail("stock_mutation_request_id", id)
}

/// Move `quantity` units from `origin` to `destination` inside `tx`
pub(crate) async fn move_stock(
    tx: &mut Tx<'_>,
    origin: i64,
    destination: i64,
    quantity: i64,
) -> ServiceResult<()> {
    apply_mutation(tx, origin, MutationType::Reduction, quantity).await?;
    apply_mutation(tx, destination, MutationType::Addition, quantity).await?;
    Ok(())
}

/// Validate and store a pending transfer request
pub async fn create_request(
    pool: &SqlitePool,
    data: StockMutationRequestCreate,
) -> ServiceResult<StockMutationRequest> {
    if data.stock <= 0 {
        return Err(AppError::validation("stock must be positive").into());
    }
    let origin = pharmacy::find_pharmacy_product(pool, data.origin_pharmacy_product_id)
        .await?
        .ok_or_else(|| pharmacy_product_not_found(data.origin_pharmacy_product_id))?;
    let destination = pharmacy::find_pharmacy_product(pool, data.destination_pharmacy_product_id)
        .await?
        .ok_or_else(|| pharmacy_product_not_found(data.destination_pharmacy_product_id))?;

    if origin.product_id != destination.product_id {
        return Err(AppError::new(ErrorCode::DifferentProduct)
            .with_detail("origin_product_id", origin.product_id)
            .with_detail("destination_product_id", destination.product_id)
            .into());
    }
    if origin.pharmacy_id == destination.pharmacy_id {
        return Err(AppError::new(ErrorCode::FromOwnPharmacy)
            .with_detail("pharmacy_id", origin.pharmacy_id)
            .into());
    }
    if origin.stock < data.stock {
        return Err(AppError::insufficient_stock(origin.id, origin.stock, data.stock).into());
    }

    let created = requests::insert(
        pool,
        NewRequest {
            origin_pharmacy_product_id: origin.id,
            destination_pharmacy_product_id: destination.id,
            stock: data.stock,
            status: MutationRequestStatus::Pending,
            order_detail_id: None,
        },
    )
    .await?;

    tracing::info!(
        request_id = created.id,
        origin = origin.id,
        destination = destination.id,
        stock = data.stock,
        "Stock mutation request created"
    );
    Ok(created)
}

/// Approve or reject a pending request
///
/// Approval re-checks origin stock at decision time; if it no longer covers
/// the request nothing is written and the request stays pending.
pub async fn decide_request(
    pool: &SqlitePool,
    id: i64,
    status: MutationRequestStatus,
) -> ServiceResult<StockMutationRequest> {
    if !status.is_terminal() {
        return Err(AppError::validation("status must be ACCEPTED or REJECTED").into());
    }

    let mut tx = pool.begin().await?;
    if !requests::finish(&mut tx, id, status).await? {
        let existing = requests::find_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| request_not_found(id))?;
        return Err(AppError::new(ErrorCode::MutationRequestAlreadyFinished)
            .with_detail("stock_mutation_request_id", id)
            .with_detail(
                "status",
                serde_json::to_value(existing.status).unwrap_or_default(),
            )
            .into());
    }

    let request = requests::find_by_id(&mut *tx, id)
        .await?
        .ok_or_else(|| request_not_found(id))?;
    if status == MutationRequestStatus::Accepted {
        move_stock(
            &mut tx,
            request.origin_pharmacy_product_id,
            request.destination_pharmacy_product_id,
            request.stock,
        )
        .await?;
    }
    tx.commit().await?;

    tracing::info!(request_id = id, status = ?status, "Stock mutation request decided");
    Ok(request)
}

pub async fn get_request(pool: &SqlitePool, id: i64) -> ServiceResult<StockMutationRequest> {
    requests::find_by_id(pool, id)
        .await?
        .ok_or_else(|| request_not_found(id).into())
}

pub async fn list_requests(
    pool: &SqlitePool,
    pharmacy_id: i64,
    status: Option<MutationRequestStatus>,
    page: Option<i64>,
    per_page: Option<i64>,
) -> ServiceResult<Vec<StockMutationRequest>> {
    let (limit, offset) = page_bounds(page, per_page);
    Ok(requests::list_for_pharmacy(pool, pharmacy_id, status, limit, offset).await?)
}
