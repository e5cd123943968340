//! CareerPro Entitlements - usage metering and allowance evaluation
//!
//! The entitlement catalog maps (service, tier) pairs to limits for the
//! two quota windows; the evaluator resolves a user's effective tier from
//! subscription state and answers "may this user run this tool now?",
//! including the atomic authorize-and-record path used by tool
//! invocations.
//!
//! # Example
//!
//! ```rust,ignore
//! use careerpro_entitlements::{PlanCatalog, UsageEvaluator};
//!
//! let catalog = PlanCatalog::builtin();
//! let evaluator = UsageEvaluator::new(catalog.into(), subscriptions, usage);
//!
//! let decision = evaluator.authorize_and_record(user_id, Service::Cv).await?;
//! if !decision.recorded {
//!     // surface remaining/resets_at to the user
//! }
//! ```

pub mod catalog;
pub mod error;
pub mod evaluator;

pub use catalog::{CatalogError, PlanCatalog};
pub use error::EntitlementError;
pub use evaluator::{ConsumeResult, UsageEvaluator};
