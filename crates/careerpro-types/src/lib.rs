//! CareerPro Types - Shared domain types
//!
//! This crate contains domain types used across CareerPro services:
//! - User identity
//! - Subscription tiers, plans and overrides
//! - Metered services and entitlement results
//! - Billing and achievement types

pub mod achievement;
pub mod billing;
pub mod entitlement;
pub mod service;
pub mod subscription;
pub mod tier;
pub mod user;

pub use achievement::*;
pub use billing::*;
pub use entitlement::*;
pub use service::*;
pub use subscription::*;
pub use tier::*;
pub use user::*;
