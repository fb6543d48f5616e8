//! Pharmacy product stock: creation, manual adjustments and ledger checks

use shared::error::{AppError, ErrorCode};
use shared::models::{
    LedgerReport, MutationType, PharmacyProduct, PharmacyProductCreate, StockAdjustment,
    StockMutation,
};
use sqlx::SqlitePool;

use crate::db::repository::{RepoError, Tx, page_bounds, pharmacy, stock_ledger};
use crate::error::{ServiceError, ServiceResult};

pub(crate) fn pharmacy_product_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::PharmacyProductNotFound).with_detail("pharmacy_product_id", id)
}

/// Ledger write that refuses to leave the counter negative
///
/// An `InsufficientStock` error leaves the mutation inside `tx`; callers
/// abort by dropping the transaction.
pub(crate) async fn apply_mutation(
    tx: &mut Tx<'_>,
    pharmacy_product_id: i64,
    mutation_type: MutationType,
    quantity: i64,
) -> ServiceResult<i64> {
    let stock = stock_ledger::apply(tx, pharmacy_product_id, mutation_type, quantity)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => pharmacy_product_not_found(pharmacy_product_id).into(),
            other => ServiceError::from(other),
        })?;
    if stock < 0 {
        return Err(AppError::insufficient_stock(
            pharmacy_product_id,
            stock - mutation_type.signed(quantity),
            quantity,
        )
        .into());
    }
    Ok(stock)
}

pub async fn get_pharmacy_product(pool: &SqlitePool, id: i64) -> ServiceResult<PharmacyProduct> {
    pharmacy::find_pharmacy_product(pool, id)
        .await?
        .ok_or_else(|| pharmacy_product_not_found(id).into())
}

/// List a catalog product at a pharmacy with zero stock
pub async fn create_pharmacy_product(
    pool: &SqlitePool,
    data: PharmacyProductCreate,
) -> ServiceResult<PharmacyProduct> {
    pharmacy::find_pharmacy(pool, data.pharmacy_id)
        .await?
        .ok_or_else(|| {
            AppError::new(ErrorCode::PharmacyNotFound).with_detail("pharmacy_id", data.pharmacy_id)
        })?;
    pharmacy::find_product(pool, data.product_id)
        .await?
        .ok_or_else(|| {
            AppError::new(ErrorCode::ProductNotFound).with_detail("product_id", data.product_id)
        })?;

    let (pharmacy_id, product_id) = (data.pharmacy_id, data.product_id);
    let created = pharmacy::create_pharmacy_product(pool, data)
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => AppError::new(ErrorCode::PharmacyProductExists)
                .with_detail("pharmacy_id", pharmacy_id)
                .with_detail("product_id", product_id)
                .into(),
            other => ServiceError::from(other),
        })?;

    tracing::info!(
        pharmacy_product_id = created.id,
        pharmacy_id,
        product_id,
        "Pharmacy product created"
    );
    Ok(created)
}

/// Restock or write off through the ledger
pub async fn adjust_stock(
    pool: &SqlitePool,
    id: i64,
    adjustment: StockAdjustment,
) -> ServiceResult<PharmacyProduct> {
    if adjustment.stock <= 0 {
        return Err(AppError::validation("stock must be positive").into());
    }

    let mut tx = pool.begin().await?;
    let stock = apply_mutation(&mut tx, id, adjustment.mutation_type, adjustment.stock).await?;
    let updated = pharmacy::find_pharmacy_product(&mut *tx, id)
        .await?
        .ok_or_else(|| pharmacy_product_not_found(id))?;
    tx.commit().await?;

    tracing::info!(
        pharmacy_product_id = id,
        mutation_type = ?adjustment.mutation_type,
        quantity = adjustment.stock,
        stock,
        "Stock adjusted"
    );
    Ok(updated)
}

/// Ledger rows, newest first
pub async fn mutation_history(
    pool: &SqlitePool,
    id: i64,
    page: Option<i64>,
    per_page: Option<i64>,
) -> ServiceResult<Vec<StockMutation>> {
    get_pharmacy_product(pool, id).await?;
    let (limit, offset) = page_bounds(page, per_page);
    Ok(stock_ledger::history(pool, id, limit, offset).await?)
}

/// Compare the cached counter with the ledger
pub async fn verify_ledger(pool: &SqlitePool, id: i64) -> ServiceResult<LedgerReport> {
    let report = stock_ledger::report(pool, id)
        .await?
        .ok_or_else(|| pharmacy_product_not_found(id))?;
    if !report.consistent {
        tracing::warn!(
            pharmacy_product_id = id,
            stock = report.stock,
            ledger_sum = report.ledger_sum,
            "Stock counter disagrees with ledger"
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::testing::{product, stocked, test_pool};

    #[tokio::test]
    async fn test_adjust_restock_and_write_off() {
        let pool = test_pool().await;
        let product_id = product(&pool, "Antacid").await;
        let pp = stocked(&pool, product_id, 0.0, 0.0, 0).await;

        let pp = adjust_stock(
            &pool,
            pp.id,
            StockAdjustment {
                mutation_type: MutationType::Addition,
                stock: 12,
            },
        )
        .await
        .unwrap();
        assert_eq!(pp.stock, 12);

        let pp = adjust_stock(
            &pool,
            pp.id,
            StockAdjustment {
                mutation_type: MutationType::Reduction,
                stock: 5,
            },
        )
        .await
        .unwrap();
        assert_eq!(pp.stock, 7);

        let report = verify_ledger(&pool, pp.id).await.unwrap();
        assert!(report.consistent);
        assert_eq!(report.mutation_count, 2);
    }

    #[tokio::test]
    async fn test_write_off_beyond_stock_is_refused() {
        let pool = test_pool().await;
        let product_id = product(&pool, "Antacid").await;
        let pp = stocked(&pool, product_id, 0.0, 0.0, 3).await;

        let err = adjust_stock(
            &pool,
            pp.id,
            StockAdjustment {
                mutation_type: MutationType::Reduction,
                stock: 4,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InsufficientStock));

        let after = get_pharmacy_product(&pool, pp.id).await.unwrap();
        assert_eq!(after.stock, 3);
        assert_eq!(mutation_history(&pool, pp.id, None, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_adjust_unknown_pharmacy_product() {
        let pool = test_pool().await;
        let err = adjust_stock(
            &pool,
            77,
            StockAdjustment {
                mutation_type: MutationType::Addition,
                stock: 1,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::PharmacyProductNotFound));
    }

    #[tokio::test]
    async fn test_create_pharmacy_product_errors() {
        let pool = test_pool().await;
        let product_id = product(&pool, "Antacid").await;
        let pp = stocked(&pool, product_id, 0.0, 0.0, 0).await;

        let dup = create_pharmacy_product(
            &pool,
            PharmacyProductCreate {
                pharmacy_id: pp.pharmacy_id,
                product_id,
                price: 3.0,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(dup.code(), Some(ErrorCode::PharmacyProductExists));

        let no_pharmacy = create_pharmacy_product(
            &pool,
            PharmacyProductCreate {
                pharmacy_id: 999,
                product_id,
                price: 3.0,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(no_pharmacy.code(), Some(ErrorCode::PharmacyNotFound));

        let no_product = create_pharmacy_product(
            &pool,
            PharmacyProductCreate {
                pharmacy_id: pp.pharmacy_id,
                product_id: 999,
                price: 3.0,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(no_product.code(), Some(ErrorCode::ProductNotFound));
    }
}
