//! Order Repository
//!
//! Orders and their lines are written once at checkout. Afterwards only the
//! status log changes: each transition flips the current row's `is_latest`
//! and appends the next one. A partial unique index keeps at most one
//! latest row per order.

use super::{RepoError, RepoResult, Tx};
use shared::models::{
    Order, OrderCreate, OrderDetail, OrderStatus, OrderStatusLog, OrderWithDetails,
};
use sqlx::{Executor, Sqlite, SqlitePool};

const ORDER_COLUMNS: &str = "id, transaction_id, pharmacy_id, user_id, shipping_address, shipping_cost, total_payment, created_at";
const LOG_COLUMNS: &str = "id, order_id, status, is_latest, description, created_at";

/// An order line joined with the ordering pharmacy's stock of that product
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderLineStock {
    pub order_detail_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// `None` when the pharmacy has no pharmacy_product row for the product
    pub pharmacy_product_id: Option<i64>,
    pub stock: Option<i64>,
}

pub async fn find_order(
    conn: impl Executor<'_, Database = Sqlite>,
    id: i64,
) -> RepoResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?");
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn find_details(
    conn: impl Executor<'_, Database = Sqlite>,
    order_id: i64,
) -> RepoResult<Vec<OrderDetail>> {
    let rows = sqlx::query_as::<_, OrderDetail>(
        "SELECT id, order_id, product_id, name, content, price, quantity FROM order_detail WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

/// Order lines with the local stock for `pharmacy_id`, in line order
pub async fn find_lines_with_stock(
    conn: impl Executor<'_, Database = Sqlite>,
    order_id: i64,
    pharmacy_id: i64,
) -> RepoResult<Vec<OrderLineStock>> {
    let rows = sqlx::query_as::<_, OrderLineStock>(
        "SELECT od.id AS order_detail_id, od.product_id, od.quantity, pp.id AS pharmacy_product_id, pp.stock FROM order_detail od LEFT JOIN pharmacy_product pp ON pp.product_id = od.product_id AND pp.pharmacy_id = ?2 WHERE od.order_id = ?1 ORDER BY od.id",
    )
    .bind(order_id)
    .bind(pharmacy_id)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

pub async fn latest_status(
    conn: impl Executor<'_, Database = Sqlite>,
    order_id: i64,
) -> RepoResult<Option<OrderStatus>> {
    let status = sqlx::query_scalar::<_, OrderStatus>(
        "SELECT status FROM order_status_log WHERE order_id = ? AND is_latest = 1",
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(status)
}

/// Status history, oldest first
pub async fn find_logs(
    conn: impl Executor<'_, Database = Sqlite>,
    order_id: i64,
) -> RepoResult<Vec<OrderStatusLog>> {
    let sql = format!("SELECT {LOG_COLUMNS} FROM order_status_log WHERE order_id = ? ORDER BY id");
    let rows = sqlx::query_as::<_, OrderStatusLog>(&sql)
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

/// Retire the latest log row if it still has `expected` status
///
/// This is the first write of every transition: it takes SQLite's write lock
/// and returns `false` when the order is unknown or already moved on.
pub async fn retire_latest(
    tx: &mut Tx<'_>,
    order_id: i64,
    expected: OrderStatus,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE order_status_log SET is_latest = 0 WHERE order_id = ? AND is_latest = 1 AND status = ?",
    )
    .bind(order_id)
    .bind(expected)
    .execute(&mut **tx)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// Append the new latest log row
pub async fn insert_latest(
    tx: &mut Tx<'_>,
    order_id: i64,
    status: OrderStatus,
    description: Option<&str>,
) -> RepoResult<OrderStatusLog> {
    let sql = format!(
        "INSERT INTO order_status_log (order_id, status, is_latest, description, created_at) VALUES (?1, ?2, 1, ?3, ?4) RETURNING {LOG_COLUMNS}"
    );
    let row = sqlx::query_as::<_, OrderStatusLog>(&sql)
        .bind(order_id)
        .bind(status)
        .bind(description)
        .bind(shared::util::now_millis())
        .fetch_one(&mut **tx)
        .await?;
    Ok(row)
}

/// Persist a checked-out order with its lines and the initial `Waiting` row
pub async fn create_order(pool: &SqlitePool, data: OrderCreate) -> RepoResult<OrderWithDetails> {
    if let Some(line) = data.details.iter().find(|d| d.quantity <= 0) {
        return Err(RepoError::Validation(format!(
            "Quantity for product {} must be positive",
            line.product_id
        )));
    }
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    let sql = format!(
        "INSERT INTO orders (transaction_id, pharmacy_id, user_id, shipping_address, shipping_cost, total_payment, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING {ORDER_COLUMNS}"
    );
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(data.transaction_id)
        .bind(data.pharmacy_id)
        .bind(data.user_id)
        .bind(&data.shipping_address)
        .bind(data.shipping_cost)
        .bind(data.total_payment)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

    let mut details = Vec::with_capacity(data.details.len());
    for line in &data.details {
        let detail = sqlx::query_as::<_, OrderDetail>(
            "INSERT INTO order_detail (order_id, product_id, name, content, price, quantity) VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING id, order_id, product_id, name, content, price, quantity",
        )
        .bind(order.id)
        .bind(line.product_id)
        .bind(&line.name)
        .bind(&line.content)
        .bind(line.price)
        .bind(line.quantity)
        .fetch_one(&mut *tx)
        .await?;
        details.push(detail);
    }

    insert_latest(&mut tx, order.id, OrderStatus::Waiting, None).await?;
    tx.commit().await?;

    Ok(OrderWithDetails {
        order,
        status: OrderStatus::Waiting,
        details,
    })
}
