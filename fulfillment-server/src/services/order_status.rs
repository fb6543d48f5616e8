//! Order status state machine
//!
//! A transition is [`begin`] (retire the current log row if it still holds
//! the action's required status) followed by [`finish`] (append the target
//! status) inside one transaction. The retire step is the transaction's first
//! write, so concurrent transitions on the same order serialize on SQLite's
//! write lock and exactly one of them sees the expected status.

use shared::error::{AppError, ErrorCode};
use shared::models::{
    Order, OrderAction, OrderStatusLog, OrderTransitionResult, OrderWithDetails,
};
use sqlx::SqlitePool;

use crate::db::repository::{Tx, order};
use crate::error::ServiceResult;

pub(crate) fn order_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", id)
}

/// Guard step: claim the order for `action` or explain why not
pub(crate) async fn begin(tx: &mut Tx<'_>, order_id: i64, action: OrderAction) -> ServiceResult<Order> {
    if !order::retire_latest(tx, order_id, action.required_status()).await? {
        let err = match order::latest_status(&mut **tx, order_id).await? {
            None => order_not_found(order_id),
            Some(current) => {
                tracing::debug!(order_id, action = action.name(), status = ?current, "Transition refused");
                AppError::new(action.bad_status_code())
                    .with_detail("order_id", order_id)
                    .with_detail("status", serde_json::to_value(current).unwrap_or_default())
            }
        };
        return Err(err.into());
    }
    Ok(order::find_order(&mut **tx, order_id)
        .await?
        .ok_or_else(|| order_not_found(order_id))?)
}

/// Append the action's target status as the new latest row
pub(crate) async fn finish(
    tx: &mut Tx<'_>,
    order_id: i64,
    action: OrderAction,
    description: Option<&str>,
) -> ServiceResult<OrderStatusLog> {
    debug_assert!(
        action
            .required_status()
            .can_transition_to(action.target_status())
    );
    Ok(order::insert_latest(tx, order_id, action.target_status(), description).await?)
}

/// Status-only transition with no stock effect
pub async fn transition(
    pool: &SqlitePool,
    order_id: i64,
    action: OrderAction,
    description: Option<&str>,
) -> ServiceResult<OrderTransitionResult> {
    let mut tx = pool.begin().await?;
    begin(&mut tx, order_id, action).await?;
    let log = finish(&mut tx, order_id, action, description).await?;
    tx.commit().await?;

    tracing::info!(order_id, action = action.name(), status = ?log.status, "Order status changed");
    Ok(OrderTransitionResult {
        order_id,
        status: log.status,
        description: log.description,
        transfers: 0,
    })
}

pub async fn get_order(pool: &SqlitePool, order_id: i64) -> ServiceResult<OrderWithDetails> {
    let order = order::find_order(pool, order_id)
        .await?
        .ok_or_else(|| order_not_found(order_id))?;
    let status = order::latest_status(pool, order_id)
        .await?
        .ok_or_else(|| order_not_found(order_id))?;
    let details = order::find_details(pool, order_id).await?;
    Ok(OrderWithDetails {
        order,
        status,
        details,
    })
}

pub async fn get_logs(pool: &SqlitePool, order_id: i64) -> ServiceResult<Vec<OrderStatusLog>> {
    let logs = order::find_logs(pool, order_id).await?;
    if logs.is_empty() {
        return Err(order_not_found(order_id).into());
    }
    Ok(logs)
}
