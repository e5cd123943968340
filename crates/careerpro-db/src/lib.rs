//! CareerPro DB - Postgres persistence layer
//!
//! Row models, async repository traits and their PostgreSQL
//! implementations. The subscription table, usage ledger, achievements,
//! billing history, webhook de-duplication set and notification
//! preferences all live here; business rules live in the core crates.

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pool::{DbPool, create_pool};
pub use repo::*;
