//! Achievement errors

use thiserror::Error;

/// Achievement evaluation errors
#[derive(Error, Debug)]
pub enum AchievementError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] careerpro_db::DbError),
}
