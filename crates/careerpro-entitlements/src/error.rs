//! Entitlement errors

use thiserror::Error;

/// Entitlement evaluation errors
#[derive(Error, Debug)]
pub enum EntitlementError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] careerpro_db::DbError),
}
