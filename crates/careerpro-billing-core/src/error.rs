//! Billing errors

use thiserror::Error;

/// Billing errors
#[derive(Error, Debug)]
pub enum BillingError {
    /// Subscription not found
    #[error("subscription not found")]
    SubscriptionNotFound,

    /// The user has no payment-provider customer yet
    #[error("customer not found")]
    CustomerNotFound,

    /// No price configured for the requested item
    #[error("no price configured for {0}")]
    PriceNotConfigured(String),

    /// Payment provider error
    #[error("provider error: {0}")]
    Provider(String),

    /// Webhook verification or parsing error
    #[error("webhook error: {0}")]
    Webhook(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] careerpro_db::DbError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl BillingError {
    /// Whether this error means the webhook payload itself was bad
    /// (reject 4xx, do not let the provider retry forever)
    pub fn is_webhook_rejection(&self) -> bool {
        matches!(self, Self::Webhook(_))
    }
}
