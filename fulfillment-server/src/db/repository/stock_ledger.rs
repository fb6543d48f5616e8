//! Stock Ledger Repository
//!
//! Every change to `pharmacy_product.stock` goes through [`apply`], which
//! appends one `stock_mutation` row and moves the counter by the same signed
//! amount inside the caller's transaction. Rows are never updated or deleted
//! (the schema rejects both), so the counter can always be rebuilt from the
//! ledger.

use super::{RepoError, RepoResult, Tx};
use shared::models::{LedgerReport, MutationType, StockMutation};
use sqlx::{Executor, Sqlite};

/// Append a ledger row and move the counter, returning the new stock
///
/// The counter is allowed to go negative here; callers decide whether a
/// negative result aborts their transaction.
pub async fn apply(
    tx: &mut Tx<'_>,
    pharmacy_product_id: i64,
    mutation_type: MutationType,
    quantity: i64,
) -> RepoResult<i64> {
    if quantity <= 0 {
        return Err(RepoError::Validation(format!(
            "Mutation quantity must be positive, got {quantity}"
        )));
    }
    let now = shared::util::now_millis();

    let stock: Option<i64> = sqlx::query_scalar(
        "UPDATE pharmacy_product SET stock = stock + ?1, updated_at = ?2 WHERE id = ?3 RETURNING stock",
    )
    .bind(mutation_type.signed(quantity))
    .bind(now)
    .bind(pharmacy_product_id)
    .fetch_optional(&mut **tx)
    .await?;
    let stock = stock.ok_or_else(|| {
        RepoError::NotFound(format!("Pharmacy product {pharmacy_product_id} not found"))
    })?;

    sqlx::query(
        "INSERT INTO stock_mutation (pharmacy_product_id, mutation_type, stock, created_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(pharmacy_product_id)
    .bind(mutation_type)
    .bind(quantity)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(stock)
}

/// Ledger rows for one pharmacy product, newest first
pub async fn history(
    conn: impl Executor<'_, Database = Sqlite>,
    pharmacy_product_id: i64,
    limit: i64,
    offset: i64,
) -> RepoResult<Vec<StockMutation>> {
    let rows = sqlx::query_as::<_, StockMutation>(
        "SELECT id, pharmacy_product_id, mutation_type, stock, created_at FROM stock_mutation WHERE pharmacy_product_id = ? ORDER BY id DESC LIMIT ? OFFSET ?",
    )
    .bind(pharmacy_product_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

#[derive(sqlx::FromRow)]
struct LedgerRow {
    id: i64,
    stock: i64,
    ledger_sum: i64,
    mutation_count: i64,
}

/// Compare the stock counter against the signed sum of its ledger
pub async fn report(
    conn: impl Executor<'_, Database = Sqlite>,
    pharmacy_product_id: i64,
) -> RepoResult<Option<LedgerReport>> {
    let row = sqlx::query_as::<_, LedgerRow>(
        "SELECT pp.id, pp.stock, COALESCE((SELECT SUM(CASE sm.mutation_type WHEN 'ADDITION' THEN sm.stock ELSE -sm.stock END) FROM stock_mutation sm WHERE sm.pharmacy_product_id = pp.id), 0) AS ledger_sum, (SELECT COUNT(*) FROM stock_mutation sm WHERE sm.pharmacy_product_id = pp.id) AS mutation_count FROM pharmacy_product pp WHERE pp.id = ?",
    )
    .bind(pharmacy_product_id)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(|r| LedgerReport {
        pharmacy_product_id: r.id,
        stock: r.stock,
        ledger_sum: r.ledger_sum,
        mutation_count: r.mutation_count,
        consistent: r.stock == r.ledger_sum,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::testing::{product, stocked, test_pool};

    #[tokio::test]
    async fn test_apply_moves_counter_and_appends_row() {
        let pool = test_pool().await;
        let product_id = product(&pool, "Amoxicillin").await;
        let pp = stocked(&pool, product_id, 0.0, 0.0, 10).await;

        let mut tx = pool.begin().await.unwrap();
        let stock = apply(&mut tx, pp.id, MutationType::Reduction, 4)
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert_eq!(stock, 6);

        let rows = history(&pool, pp.id, 10, 0).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].mutation_type, MutationType::Reduction);
        assert_eq!(rows[0].stock, 4);
        assert_eq!(rows[1].mutation_type, MutationType::Addition);

        let report = report(&pool, pp.id).await.unwrap().unwrap();
        assert_eq!(report.stock, 6);
        assert_eq!(report.ledger_sum, 6);
        assert_eq!(report.mutation_count, 2);
        assert!(report.consistent);
    }

    #[tokio::test]
    async fn test_rolled_back_mutation_leaves_no_trace() {
        let pool = test_pool().await;
        let product_id = product(&pool, "Amoxicillin").await;
        let pp = stocked(&pool, product_id, 0.0, 0.0, 3).await;

        {
            let mut tx = pool.begin().await.unwrap();
            let stock = apply(&mut tx, pp.id, MutationType::Reduction, 5)
                .await
                .unwrap();
            assert_eq!(stock, -2);
            tx.rollback().await.unwrap();
        }

        let report = report(&pool, pp.id).await.unwrap().unwrap();
        assert_eq!(report.stock, 3);
        assert_eq!(report.mutation_count, 1);
        assert!(report.consistent);
    }

    #[tokio::test]
    async fn test_apply_rejects_non_positive_quantity() {
        let pool = test_pool().await;
        let product_id = product(&pool, "Amoxicillin").await;
        let pp = stocked(&pool, product_id, 0.0, 0.0, 0).await;

        let mut tx = pool.begin().await.unwrap();
        let err = apply(&mut tx, pp.id, MutationType::Addition, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[tokio::test]
    async fn test_apply_unknown_pharmacy_product() {
        let pool = test_pool().await;
        let mut tx = pool.begin().await.unwrap();
        let err = apply(&mut tx, 404, MutationType::Addition, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_ledger_rows_are_append_only() {
        let pool = test_pool().await;
        let product_id = product(&pool, "Amoxicillin").await;
        let pp = stocked(&pool, product_id, 0.0, 0.0, 3).await;

        let update = sqlx::query("UPDATE stock_mutation SET stock = 99 WHERE pharmacy_product_id = ?")
            .bind(pp.id)
            .execute(&pool)
            .await;
        assert!(update.is_err());
        let delete = sqlx::query("DELETE FROM stock_mutation")
            .execute(&pool)
            .await;
        assert!(delete.is_err());
    }

    #[tokio::test]
    async fn test_report_detects_drift() {
        let pool = test_pool().await;
        let product_id = product(&pool, "Amoxicillin").await;
        let pp = stocked(&pool, product_id, 0.0, 0.0, 3).await;

        sqlx::query("UPDATE pharmacy_product SET stock = 7 WHERE id = ?")
            .bind(pp.id)
            .execute(&pool)
            .await
            .unwrap();

        let report = report(&pool, pp.id).await.unwrap().unwrap();
        assert_eq!(report.ledger_sum, 3);
        assert!(!report.consistent);
        assert!(super::report(&pool, 404).await.unwrap().is_none());
    }
}
