//! Payment provider abstraction

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use careerpro_types::{CheckoutItem, CheckoutSession, PortalSession, UserId};

use crate::error::BillingError;

/// Subscription state as reported by the provider
#[derive(Debug, Clone)]
pub struct ProviderSubscription {
    /// Provider subscription ID
    pub id: String,
    /// Provider customer ID
    pub customer_id: String,
    /// Raw provider status string
    pub status: String,
    /// Current period start
    pub period_start: DateTime<Utc>,
    /// Current period end
    pub period_end: DateTime<Utc>,
    /// Whether the subscription cancels at period end
    pub cancel_at_period_end: bool,
}

/// Payment provider trait
///
/// Abstracts payment processing so the sync service can be tested
/// without network access.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a checkout session for a user.
    ///
    /// The session must carry the user ID as its client reference so the
    /// completion webhook can be attributed, plus item metadata describing
    /// what was purchased.
    async fn create_checkout_session(
        &self,
        user_id: UserId,
        item: CheckoutItem,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, BillingError>;

    /// Create a customer portal session
    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, BillingError>;

    /// Fetch a subscription (idempotent read; implementations may retry)
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<ProviderSubscription, BillingError>;
}
