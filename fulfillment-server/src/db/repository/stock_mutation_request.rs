//! Stock Mutation Request Repository

use super::{RepoResult, Tx};
use shared::models::{MutationRequestStatus, StockMutationRequest};
use sqlx::{Executor, Sqlite};

const COLUMNS: &str = "id, origin_pharmacy_product_id, destination_pharmacy_product_id, stock, status, order_detail_id, created_at, updated_at";

/// Fields of a new request row
#[derive(Debug, Clone, Copy)]
pub struct NewRequest {
    pub origin_pharmacy_product_id: i64,
    pub destination_pharmacy_product_id: i64,
    pub stock: i64,
    pub status: MutationRequestStatus,
    pub order_detail_id: Option<i64>,
}

pub async fn insert(
    conn: impl Executor<'_, Database = Sqlite>,
    data: NewRequest,
) -> RepoResult<StockMutationRequest> {
    let now = shared::util::now_millis();
    let sql = format!(
        "INSERT INTO stock_mutation_request (origin_pharmacy_product_id, destination_pharmacy_product_id, stock, status, order_detail_id, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6) RETURNING {COLUMNS}"
    );
    let row = sqlx::query_as::<_, StockMutationRequest>(&sql)
        .bind(data.origin_pharmacy_product_id)
        .bind(data.destination_pharmacy_product_id)
        .bind(data.stock)
        .bind(data.status)
        .bind(data.order_detail_id)
        .bind(now)
        .fetch_one(conn)
        .await?;
    Ok(row)
}

pub async fn find_by_id(
    conn: impl Executor<'_, Database = Sqlite>,
    id: i64,
) -> RepoResult<Option<StockMutationRequest>> {
    let sql = format!("SELECT {COLUMNS} FROM stock_mutation_request WHERE id = ?");
    let row = sqlx::query_as::<_, StockMutationRequest>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// The accepted transfer that served an order line, if one was needed
pub async fn find_accepted_by_order_detail(
    conn: impl Executor<'_, Database = Sqlite>,
    order_detail_id: i64,
) -> RepoResult<Option<StockMutationRequest>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM stock_mutation_request WHERE order_detail_id = ? AND status = 'ACCEPTED' ORDER BY id DESC LIMIT 1"
    );
    let row = sqlx::query_as::<_, StockMutationRequest>(&sql)
        .bind(order_detail_id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Requests where the pharmacy is origin or destination, newest first
pub async fn list_for_pharmacy(
    conn: impl Executor<'_, Database = Sqlite>,
    pharmacy_id: i64,
    status: Option<MutationRequestStatus>,
    limit: i64,
    offset: i64,
) -> RepoResult<Vec<StockMutationRequest>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM stock_mutation_request WHERE (origin_pharmacy_product_id IN (SELECT id FROM pharmacy_product WHERE pharmacy_id = ?1) OR destination_pharmacy_product_id IN (SELECT id FROM pharmacy_product WHERE pharmacy_id = ?1)) AND (?2 IS NULL OR status = ?2) ORDER BY id DESC LIMIT ?3 OFFSET ?4"
    );
    let rows = sqlx::query_as::<_, StockMutationRequest>(&sql)
        .bind(pharmacy_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

/// Move a pending request to `status`
///
/// Returns `false` when the request is missing or no longer pending. The
/// update takes the write lock, so two concurrent decisions cannot both win.
pub async fn finish(tx: &mut Tx<'_>, id: i64, status: MutationRequestStatus) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE stock_mutation_request SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = 'PENDING'",
    )
    .bind(status)
    .bind(shared::util::now_millis())
    .bind(id)
    .execute(&mut **tx)
    .await?;
    Ok(rows.rows_affected() == 1)
}
