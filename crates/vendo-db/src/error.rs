//! Database error types

use thiserror::Error;
use vendo_types::VendoError;

/// Database operation errors
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Lock or statement timeout")]
    Timeout,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Query error: {0}")]
    Query(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if let Some(code) = db.code() {
                match code.as_ref() {
                    // unique_violation
                    "23505" => {
                        let what = db.constraint().unwrap_or("unique constraint");
                        return DbError::Duplicate(what.to_string());
                    }
                    // lock_not_available, query_canceled (statement_timeout)
                    "55P03" | "57014" => return DbError::Timeout,
                    _ => {}
                }
            }
        }
        DbError::Query(e)
    }
}

impl From<serde_json::Error> for DbError {
    fn from(e: serde_json::Error) -> Self {
        DbError::InvalidInput(e.to_string())
    }
}

impl From<DbError> for VendoError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Timeout => VendoError::LockTimeout,
            DbError::Duplicate(what) => VendoError::DuplicateOrder {
                idempotency_key: what,
            },
            other => VendoError::storage(other.to_string()),
        }
    }
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_maps_to_retriable() {
        let err: VendoError = DbError::Timeout.into();
        assert_eq!(err.error_code(), "LOCK_TIMEOUT");
        assert!(err.is_retriable());
    }

    #[test]
    fn test_duplicate_maps_to_conflict() {
        let err: VendoError = DbError::Duplicate("uq_orders_idempotency_key".into()).into();
        assert_eq!(err.error_code(), "DUPLICATE_ORDER");
        assert!(!err.is_retriable());
    }

    #[test]
    fn test_query_maps_to_storage() {
        let err: VendoError = DbError::Connection("refused".into()).into();
        assert_eq!(err.error_code(), "STORAGE_ERROR");
        assert!(err.is_retriable());
    }
}
