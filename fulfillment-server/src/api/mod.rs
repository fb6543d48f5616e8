//! HTTP API
//!
//! All `/api` routes require a bearer token and answer with the
//! [`ApiResponse`] envelope.

pub mod health;
pub mod orders;
pub mod pharmacy_products;
pub mod stock_mutations;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde::Deserialize;
use shared::error::ApiResponse;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::error::ServiceError;
use crate::state::AppState;

/// Handler result: envelope on success, error envelope otherwise
pub type ApiResult<T> = Result<ApiResponse<T>, ServiceError>;

/// `?page=&per_page=` query
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let timeout = state.config.request_timeout;

    let orders = Router::new()
        .route("/api/orders/{id}", get(orders::get_order))
        .route("/api/orders/{id}/logs", get(orders::get_logs))
        .route("/api/orders/{id}/confirm", post(orders::confirm))
        .route("/api/orders/{id}/reject", post(orders::reject))
        .route("/api/orders/{id}/ship", post(orders::ship))
        .route("/api/orders/{id}/receive", post(orders::receive))
        .route("/api/orders/{id}/cancel", post(orders::cancel));

    let stock_mutations = Router::new()
        .route(
            "/api/stock-mutations",
            post(stock_mutations::create).get(stock_mutations::list),
        )
        .route("/api/stock-mutations/{id}", get(stock_mutations::get))
        .route(
            "/api/stock-mutations/{id}/status",
            post(stock_mutations::decide),
        );

    let pharmacy_products = Router::new()
        .route("/api/pharmacy-products", post(pharmacy_products::create))
        .route("/api/pharmacy-products/{id}", get(pharmacy_products::get))
        .route(
            "/api/pharmacy-products/{id}/stock",
            post(pharmacy_products::adjust_stock),
        )
        .route(
            "/api/pharmacy-products/{id}/mutations",
            get(pharmacy_products::mutations),
        )
        .route(
            "/api/pharmacy-products/{id}/ledger",
            get(pharmacy_products::ledger),
        );

    Router::new()
        .route("/health", get(health::health_check))
        .merge(orders)
        .merge(stock_mutations)
        .merge(pharmacy_products)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
