//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// A stored value does not fit the domain model
    #[error("corrupt row: {0}")]
    Decode(String),
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;
