//! Manual stock transfer requests between pharmacies
//!
//! The destination pharmacy asks, the origin pharmacy decides.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use shared::error::ApiResponse;
use shared::models::{
    MutationRequestStatus, StockMutationRequest, StockMutationRequestCreate,
    StockMutationRequestDecision,
};

use crate::auth::CurrentUser;
use crate::services::{inventory, stock_transfer};
use crate::state::AppState;

use super::ApiResult;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Defaults to the caller's own pharmacy
    pub pharmacy_id: Option<i64>,
    pub status: Option<MutationRequestStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// POST /api/stock-mutations
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(data): Json<StockMutationRequestCreate>,
) -> ApiResult<StockMutationRequest> {
    let destination =
        inventory::get_pharmacy_product(&state.pool, data.destination_pharmacy_product_id).await?;
    user.ensure_pharmacy_admin(destination.pharmacy_id)?;

    let created = stock_transfer::create_request(&state.pool, data).await?;
    Ok(ApiResponse::success(created))
}

/// GET /api/stock-mutations
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<StockMutationRequest>> {
    let pharmacy_id = match query.pharmacy_id {
        Some(id) => id,
        None => user.admin_pharmacy()?,
    };
    user.ensure_pharmacy_admin(pharmacy_id)?;

    let rows = stock_transfer::list_requests(
        &state.pool,
        pharmacy_id,
        query.status,
        query.page,
        query.per_page,
    )
    .await?;
    Ok(ApiResponse::success(rows))
}

/// GET /api/stock-mutations/{id}
pub async fn get(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StockMutationRequest> {
    let request = stock_transfer::get_request(&state.pool, id).await?;
    let origin =
        inventory::get_pharmacy_product(&state.pool, request.origin_pharmacy_product_id).await?;
    if user.ensure_pharmacy_admin(origin.pharmacy_id).is_err() {
        let destination =
            inventory::get_pharmacy_product(&state.pool, request.destination_pharmacy_product_id)
                .await?;
        user.ensure_pharmacy_admin(destination.pharmacy_id)?;
    }
    Ok(ApiResponse::success(request))
}

/// POST /api/stock-mutations/{id}/status
pub async fn decide(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(decision): Json<StockMutationRequestDecision>,
) -> ApiResult<StockMutationRequest> {
    let request = stock_transfer::get_request(&state.pool, id).await?;
    let origin =
        inventory::get_pharmacy_product(&state.pool, request.origin_pharmacy_product_id).await?;
    user.ensure_pharmacy_admin(origin.pharmacy_id)?;

    let decided = stock_transfer::decide_request(&state.pool, id, decision.status).await?;
    Ok(ApiResponse::success(decided))
}
