//! Seed helpers for integration tests
//!
//! Each test gets its own database file in a temp dir, opened through the
//! same code path as the server (WAL, busy timeout, migrations).

#![allow(dead_code)]

use fulfillment_server::db::DbService;
use fulfillment_server::db::repository::{order, pharmacy};
use fulfillment_server::services::inventory;
use shared::models::{
    MutationType, OrderCreate, OrderDetailCreate, OrderWithDetails, Pharmacy, PharmacyCreate,
    PharmacyProduct, PharmacyProductCreate, ProductCreate, StockAdjustment,
};
use sqlx::SqlitePool;
use tempfile::TempDir;

pub const RADIUS_KM: f64 = 25.0;

/// Roughly 1.1 km of latitude
pub const KM: f64 = 0.01;

pub struct TestDb {
    pub pool: SqlitePool,
    _dir: TempDir,
}

pub async fn setup() -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fulfillment.db");
    let db = DbService::new(path.to_str().unwrap()).await.unwrap();
    TestDb {
        pool: db.pool,
        _dir: dir,
    }
}

pub async fn pharmacy_at(pool: &SqlitePool, name: &str, latitude: f64, longitude: f64) -> Pharmacy {
    pharmacy::create_pharmacy(
        pool,
        PharmacyCreate {
            name: name.to_string(),
            address: format!("{name} street"),
            latitude,
            longitude,
        },
    )
    .await
    .unwrap()
}

pub async fn product(pool: &SqlitePool, name: &str) -> i64 {
    pharmacy::create_product(
        pool,
        ProductCreate {
            name: name.to_string(),
            content: "strip of 10".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

/// List `product_id` at the pharmacy and restock it through the ledger
pub async fn listing(
    pool: &SqlitePool,
    pharmacy_id: i64,
    product_id: i64,
    stock: i64,
) -> PharmacyProduct {
    let pp = inventory::create_pharmacy_product(
        pool,
        PharmacyProductCreate {
            pharmacy_id,
            product_id,
            price: 15.0,
        },
    )
    .await
    .unwrap();
    if stock == 0 {
        return pp;
    }
    inventory::adjust_stock(
        pool,
        pp.id,
        StockAdjustment {
            mutation_type: MutationType::Addition,
            stock,
        },
    )
    .await
    .unwrap()
}

pub async fn place_order(
    pool: &SqlitePool,
    pharmacy_id: i64,
    user_id: i64,
    lines: &[(i64, i64)],
) -> OrderWithDetails {
    order::create_order(
        pool,
        OrderCreate {
            transaction_id: 1,
            pharmacy_id,
            user_id,
            shipping_address: "Jl. Gatot Subroto 10".into(),
            shipping_cost: 10.0,
            total_payment: 100.0,
            details: lines
                .iter()
                .map(|&(product_id, quantity)| OrderDetailCreate {
                    product_id,
                    name: format!("Product {product_id}"),
                    content: String::new(),
                    price: 15.0,
                    quantity,
                })
                .collect(),
        },
    )
    .await
    .unwrap()
}

pub async fn stock_of(pool: &SqlitePool, pharmacy_product_id: i64) -> i64 {
    inventory::get_pharmacy_product(pool, pharmacy_product_id)
        .await
        .unwrap()
        .stock
}

pub async fn assert_ledger_consistent(pool: &SqlitePool, ids: &[i64]) {
    for &id in ids {
        let report = inventory::verify_ledger(pool, id).await.unwrap();
        assert!(report.consistent, "ledger drift at {id}: {report:?}");
    }
}
