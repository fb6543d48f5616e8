//! Order endpoints: view an order and move it through its lifecycle

use axum::Json;
use axum::extract::{Path, State};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{
    Order, OrderAction, OrderStatusLog, OrderTransitionRequest, OrderTransitionResult,
    OrderWithDetails,
};

use crate::auth::{CurrentUser, Role};
use crate::db::repository::order;
use crate::services::order_status::{self, order_not_found};
use crate::services::fulfillment;
use crate::state::AppState;

use super::ApiResult;

const MAX_DESCRIPTION_LEN: usize = 500;

/// Customers see their own orders, pharmacy admins their pharmacy's
fn authorize_view(user: &CurrentUser, order: &Order) -> Result<(), AppError> {
    match user.role {
        Role::User => user.ensure_user(order.user_id),
        Role::PharmacyAdmin | Role::SuperAdmin => user.ensure_pharmacy_admin(order.pharmacy_id),
    }
}

/// Receipt is confirmed by the customer; every other action by the pharmacy
fn authorize_action(user: &CurrentUser, order: &Order, action: OrderAction) -> Result<(), AppError> {
    match action {
        OrderAction::Receive => user.ensure_user(order.user_id),
        _ => user.ensure_pharmacy_admin(order.pharmacy_id),
    }
}

/// GET /api/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<OrderWithDetails> {
    let order = order_status::get_order(&state.pool, id).await?;
    authorize_view(&user, &order.order)?;
    Ok(ApiResponse::success(order))
}

/// GET /api/orders/{id}/logs
pub async fn get_logs(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Vec<OrderStatusLog>> {
    let order = order::find_order(&state.pool, id)
        .await?
        .ok_or_else(|| order_not_found(id))?;
    authorize_view(&user, &order)?;
    Ok(ApiResponse::success(
        order_status::get_logs(&state.pool, id).await?,
    ))
}

async fn run(
    state: AppState,
    user: CurrentUser,
    id: i64,
    action: OrderAction,
    body: Option<Json<OrderTransitionRequest>>,
) -> ApiResult<OrderTransitionResult> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    if description.is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN) {
        return Err(AppError::validation(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        ))
        .into());
    }

    let order = order::find_order(&state.pool, id)
        .await?
        .ok_or_else(|| order_not_found(id))?;
    authorize_action(&user, &order, action)?;

    let result = fulfillment::perform(
        &state.pool,
        state.config.transfer_radius_km,
        id,
        action,
        description,
    )
    .await?;

    // Acceptance without a supplier cancels instead of failing
    if result.status != action.target_status() {
        return Ok(ApiResponse::success_with_message(
            ErrorCode::NoPharmacyToStockTransfer.message(),
            result,
        ));
    }
    Ok(ApiResponse::success(result))
}

/// POST /api/orders/{id}/confirm
pub async fn confirm(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    body: Option<Json<OrderTransitionRequest>>,
) -> ApiResult<OrderTransitionResult> {
    run(state, user, id, OrderAction::Confirm, body).await
}

/// POST /api/orders/{id}/reject
pub async fn reject(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    body: Option<Json<OrderTransitionRequest>>,
) -> ApiResult<OrderTransitionResult> {
    run(state, user, id, OrderAction::Reject, body).await
}

/// POST /api/orders/{id}/ship
pub async fn ship(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    body: Option<Json<OrderTransitionRequest>>,
) -> ApiResult<OrderTransitionResult> {
    run(state, user, id, OrderAction::Ship, body).await
}

/// POST /api/orders/{id}/receive
pub async fn receive(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    body: Option<Json<OrderTransitionRequest>>,
) -> ApiResult<OrderTransitionResult> {
    run(state, user, id, OrderAction::Receive, body).await
}

/// POST /api/orders/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    body: Option<Json<OrderTransitionRequest>>,
) -> ApiResult<OrderTransitionResult> {
    run(state, user, id, OrderAction::Cancel, body).await
}
