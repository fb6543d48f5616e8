//! Repository Module
//!
//! Free functions over SQLite. Reads take any executor so they work on the
//! pool and inside a transaction alike; writes that must stay atomic with
//! other writes take the transaction explicitly.

pub mod order;
pub mod pharmacy;
pub mod proximity;
pub mod stock_ledger;
pub mod stock_mutation_request;

use thiserror::Error;

/// SQLite transaction handle used by multi-step writes
pub type Tx<'a> = sqlx::Transaction<'a, sqlx::Sqlite>;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Another writer held the lock past the busy timeout; safe to retry
    #[error("Database busy: {0}")]
    Busy(String),
}

/// SQLite primary result codes (extended codes keep these in the low byte)
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound(err.to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    return RepoError::Duplicate(db_err.message().to_string());
                }
                let primary = db_err
                    .code()
                    .and_then(|c| c.parse::<i32>().ok())
                    .map(|c| c & 0xff);
                match primary {
                    Some(SQLITE_BUSY) | Some(SQLITE_LOCKED) => {
                        RepoError::Busy(db_err.message().to_string())
                    }
                    _ => RepoError::Database(err.to_string()),
                }
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Clamp page / per_page query values into a LIMIT / OFFSET pair
pub fn page_bounds(page: Option<i64>, per_page: Option<i64>) -> (i64, i64) {
    let per_page = per_page.unwrap_or(50).clamp(1, 200);
    let page = page.unwrap_or(1).max(1);
    (per_page, (page - 1) * per_page)
}
