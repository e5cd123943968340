//! HTTP handlers

mod achievements;
mod entitlements;
mod health;
mod notifications;
mod shared;
mod subscription;
mod webhook;

pub use achievements::{check_achievements, list_achievements};
pub use entitlements::{
    check_entitlement, consume_usage, purge_usage, record_usage, usage_summary,
};
pub use health::{health, ready};
pub use notifications::send_notification;
pub use subscription::{billing_history, create_checkout, create_portal, get_subscription};
pub use webhook::stripe_webhook;
