//! Email errors

use thiserror::Error;

/// Email errors
#[derive(Error, Debug)]
pub enum EmailError {
    /// No template registered under this name
    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    /// A template placeholder was not supplied
    #[error("missing variable {variable} for template {template}")]
    MissingVariable { template: String, variable: String },

    /// The email API rejected or never received the send
    #[error("send failed: {0}")]
    Send(String),

    /// Database error while reading preferences
    #[error("database error: {0}")]
    Database(#[from] careerpro_db::DbError),
}
