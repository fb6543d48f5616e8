//! Pharmacy product endpoints: listing, stock adjustments and the ledger

use axum::Json;
use axum::extract::{Path, Query, State};
use shared::error::ApiResponse;
use shared::models::{
    LedgerReport, PharmacyProduct, PharmacyProductCreate, StockAdjustment, StockMutation,
};

use crate::auth::CurrentUser;
use crate::services::inventory;
use crate::state::AppState;

use super::{ApiResult, PageQuery};

/// POST /api/pharmacy-products
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(data): Json<PharmacyProductCreate>,
) -> ApiResult<PharmacyProduct> {
    user.ensure_pharmacy_admin(data.pharmacy_id)?;
    let created = inventory::create_pharmacy_product(&state.pool, data).await?;
    Ok(ApiResponse::success(created))
}

/// GET /api/pharmacy-products/{id}
pub async fn get(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<PharmacyProduct> {
    Ok(ApiResponse::success(
        inventory::get_pharmacy_product(&state.pool, id).await?,
    ))
}

/// POST /api/pharmacy-products/{id}/stock
pub async fn adjust_stock(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(adjustment): Json<StockAdjustment>,
) -> ApiResult<PharmacyProduct> {
    let pp = inventory::get_pharmacy_product(&state.pool, id).await?;
    user.ensure_pharmacy_admin(pp.pharmacy_id)?;
    let updated = inventory::adjust_stock(&state.pool, id, adjustment).await?;
    Ok(ApiResponse::success(updated))
}

/// GET /api/pharmacy-products/{id}/mutations
pub async fn mutations(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Vec<StockMutation>> {
    let pp = inventory::get_pharmacy_product(&state.pool, id).await?;
    user.ensure_pharmacy_admin(pp.pharmacy_id)?;
    let rows = inventory::mutation_history(&state.pool, id, query.page, query.per_page).await?;
    Ok(ApiResponse::success(rows))
}

/// GET /api/pharmacy-products/{id}/ledger
pub async fn ledger(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<LedgerReport> {
    let pp = inventory::get_pharmacy_product(&state.pool, id).await?;
    user.ensure_pharmacy_admin(pp.pharmacy_id)?;
    Ok(ApiResponse::success(
        inventory::verify_ledger(&state.pool, id).await?,
    ))
}
