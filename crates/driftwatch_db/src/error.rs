//! Error types for the ledger store.

use thiserror::Error;

/// Ledger operation result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Ledger store errors.
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error (connection, query, etc.)
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// IO error (file system operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database file or resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A persisted row that cannot be interpreted (bad timestamp, etc.)
    #[error("Corrupt ledger row: {0}")]
    Corrupt(String),
}

impl DbError {
    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a corrupt-row error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }
}
