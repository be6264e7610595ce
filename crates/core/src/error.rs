//! Unified error types for the meetups store.
//!
//! Constraint failures reported by SQLite are classified into dedicated
//! variants so callers can tell a duplicate id from a dangling reference.

use tokio_rusqlite::rusqlite::{self, ErrorCode, ffi};

/// Unified error types for the meetups store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A row expected to exist was not found (e.g., the update marker).
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Input rejected before reaching the store (e.g., an empty event name).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Primary key or unique constraint violated.
    #[error("UNIQUE_VIOLATION: {0}")]
    UniqueViolation(String),

    /// A foreign key did not resolve to an existing row.
    #[error("FOREIGN_KEY_VIOLATION: {0}")]
    ForeignKeyViolation(String),

    /// CHECK or NOT NULL constraint violated.
    #[error("CONSTRAINT_VIOLATION: {0}")]
    ConstraintViolation(String),

    /// Database operation failed.
    #[error("STORE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_ERROR: migration failed: {0}")]
    MigrationFailed(String),
}

impl Error {
    /// Map a raw SQLite error onto the constraint variants where possible.
    fn classify(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, msg) = &err {
            if failure.code == ErrorCode::ConstraintViolation {
                let detail = msg.clone().unwrap_or_else(|| failure.to_string());
                return match failure.extended_code {
                    ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => Error::UniqueViolation(detail),
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Error::ForeignKeyViolation(detail),
                    _ => Error::ConstraintViolation(detail),
                };
            }
        }
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => Error::classify(e),
            other => Error::Database(other),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::classify(err)
    }
}
