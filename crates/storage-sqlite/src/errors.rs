//! Storage-specific error types for SQLite operations.
//!
//! Errors raised by `rusqlite` and by document (de)serialization are wrapped
//! here and converted to `papertrade_core::Error` before leaving the crate.

use papertrade_core::errors::{DatabaseError, Error};
use rusqlite::ErrorCode;
use thiserror::Error;

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(#[from] rusqlite::Error),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// An error raised by a write job itself, passed through untouched.
    #[error(transparent)]
    Core(#[from] Error),
}

impl StorageError {
    /// SQLite could not take the lock within the busy timeout.
    pub fn is_busy(&self) -> bool {
        match self {
            StorageError::QueryFailed(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConnectionFailed(e) => {
                Error::Database(DatabaseError::ConnectionFailed(e))
            }
            StorageError::QueryFailed(rusqlite::Error::QueryReturnedNoRows) => {
                Error::Database(DatabaseError::NotFound("Record not found".to_string()))
            }
            StorageError::QueryFailed(rusqlite::Error::SqliteFailure(failure, message))
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                Error::Database(DatabaseError::Conflict(
                    message.unwrap_or_else(|| failure.to_string()),
                ))
            }
            StorageError::QueryFailed(e) => Error::Database(DatabaseError::QueryFailed(e.to_string())),
            StorageError::MigrationFailed(e) => Error::Database(DatabaseError::Internal(e)),
            StorageError::SerializationError(e) => {
                Error::Database(DatabaseError::Serialization(e.to_string()))
            }
            StorageError::Core(e) => e,
        }
    }
}

/// Extension trait to convert `rusqlite` results to core results.
///
/// The orphan rule forbids `From<rusqlite::Error> for Error`, so the
/// conversion goes through [`StorageError`].
pub trait IntoCore<T> {
    fn into_core(self) -> papertrade_core::Result<T>;
}

impl<T> IntoCore<T> for std::result::Result<T, rusqlite::Error> {
    fn into_core(self) -> papertrade_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    fn sqlite_failure(code: std::os::raw::c_int) -> StorageError {
        StorageError::QueryFailed(rusqlite::Error::SqliteFailure(
            ffi::Error::new(code),
            Some("detail".to_string()),
        ))
    }

    #[test]
    fn test_busy_is_detected() {
        assert!(sqlite_failure(ffi::SQLITE_BUSY).is_busy());
        assert!(!sqlite_failure(ffi::SQLITE_CONSTRAINT).is_busy());
    }

    #[test]
    fn test_conversion_to_core() {
        let not_found: Error = StorageError::QueryFailed(rusqlite::Error::QueryReturnedNoRows).into();
        assert!(matches!(not_found, Error::Database(DatabaseError::NotFound(_))));

        let conflict: Error = sqlite_failure(ffi::SQLITE_CONSTRAINT).into();
        assert!(matches!(conflict, Error::Database(DatabaseError::Conflict(_))));

        let passthrough: Error =
            StorageError::Core(Error::Repository("job failed".to_string())).into();
        assert!(matches!(passthrough, Error::Repository(_)));
    }
}
