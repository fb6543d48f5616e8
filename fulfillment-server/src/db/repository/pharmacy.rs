//! Pharmacy, Product and Pharmacy Product Repository

use super::{RepoError, RepoResult};
use shared::models::{
    Pharmacy, PharmacyCreate, PharmacyProduct, PharmacyProductCreate, Product, ProductCreate,
};
use sqlx::{Executor, Sqlite, SqlitePool};

const PHARMACY_PRODUCT_COLUMNS: &str =
    "id, pharmacy_id, product_id, stock, price, is_active, created_at, updated_at";

// ── Pharmacy ────────────────────────────────────────────────

pub async fn find_pharmacy(
    conn: impl Executor<'_, Database = Sqlite>,
    id: i64,
) -> RepoResult<Option<Pharmacy>> {
    let row = sqlx::query_as::<_, Pharmacy>(
        "SELECT id, name, address, latitude, longitude, is_active, created_at FROM pharmacy WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

pub async fn create_pharmacy(pool: &SqlitePool, data: PharmacyCreate) -> RepoResult<Pharmacy> {
    if !(-90.0..=90.0).contains(&data.latitude) || !(-180.0..=180.0).contains(&data.longitude) {
        return Err(RepoError::Validation(format!(
            "Coordinates out of range: {}, {}",
            data.latitude, data.longitude
        )));
    }
    let now = shared::util::now_millis();
    let row = sqlx::query_as::<_, Pharmacy>(
        "INSERT INTO pharmacy (name, address, latitude, longitude, is_active, created_at) VALUES (?1, ?2, ?3, ?4, 1, ?5) RETURNING id, name, address, latitude, longitude, is_active, created_at",
    )
    .bind(&data.name)
    .bind(&data.address)
    .bind(data.latitude)
    .bind(data.longitude)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn set_pharmacy_active(pool: &SqlitePool, id: i64, is_active: bool) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE pharmacy SET is_active = ? WHERE id = ?")
        .bind(is_active)
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Pharmacy {id} not found")));
    }
    Ok(())
}

// ── Product ─────────────────────────────────────────────────

pub async fn find_product(
    conn: impl Executor<'_, Database = Sqlite>,
    id: i64,
) -> RepoResult<Option<Product>> {
    let row = sqlx::query_as::<_, Product>("SELECT id, name, content FROM product WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn create_product(pool: &SqlitePool, data: ProductCreate) -> RepoResult<Product> {
    let row = sqlx::query_as::<_, Product>(
        "INSERT INTO product (name, content) VALUES (?1, ?2) RETURNING id, name, content",
    )
    .bind(&data.name)
    .bind(&data.content)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

// ── Pharmacy Product ────────────────────────────────────────

pub async fn find_pharmacy_product(
    conn: impl Executor<'_, Database = Sqlite>,
    id: i64,
) -> RepoResult<Option<PharmacyProduct>> {
    let sql = format!("SELECT {PHARMACY_PRODUCT_COLUMNS} FROM pharmacy_product WHERE id = ?");
    let row = sqlx::query_as::<_, PharmacyProduct>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn find_pharmacy_product_by_pair(
    conn: impl Executor<'_, Database = Sqlite>,
    pharmacy_id: i64,
    product_id: i64,
) -> RepoResult<Option<PharmacyProduct>> {
    let sql = format!(
        "SELECT {PHARMACY_PRODUCT_COLUMNS} FROM pharmacy_product WHERE pharmacy_id = ? AND product_id = ?"
    );
    let row = sqlx::query_as::<_, PharmacyProduct>(&sql)
        .bind(pharmacy_id)
        .bind(product_id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Insert a pharmacy product with zero stock
///
/// Stock only ever arrives through the ledger afterwards.
pub async fn create_pharmacy_product(
    pool: &SqlitePool,
    data: PharmacyProductCreate,
) -> RepoResult<PharmacyProduct> {
    if data.price < 0.0 {
        return Err(RepoError::Validation("price must not be negative".into()));
    }
    let now = shared::util::now_millis();
    let sql = format!(
        "INSERT INTO pharmacy_product (pharmacy_id, product_id, stock, price, is_active, created_at, updated_at) VALUES (?1, ?2, 0, ?3, 1, ?4, ?4) RETURNING {PHARMACY_PRODUCT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, PharmacyProduct>(&sql)
        .bind(data.pharmacy_id)
        .bind(data.product_id)
        .bind(data.price)
        .bind(now)
        .fetch_one(pool)
        .await?;
    Ok(row)
}
