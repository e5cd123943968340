//! Billing configuration

use std::collections::HashMap;
use std::time::Duration;

use careerpro_types::{CheckoutItem, Service, Tier};

/// Billing service configuration
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// Stripe price IDs for package plans
    pub package_price_ids: HashMap<Tier, String>,
    /// Stripe price IDs for single-service upgrades
    pub service_price_ids: HashMap<Service, String>,
    /// Default success URL for checkout
    pub default_success_url: String,
    /// Default cancel URL for checkout
    pub default_cancel_url: String,
    /// Default return URL for the billing portal
    pub default_portal_return_url: String,
    /// Timeout applied to every provider HTTP call
    pub request_timeout: Duration,
}

impl BillingConfig {
    /// Create a new billing config
    pub fn new(
        stripe_secret_key: impl Into<String>,
        stripe_webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            stripe_secret_key: stripe_secret_key.into(),
            stripe_webhook_secret: stripe_webhook_secret.into(),
            package_price_ids: HashMap::new(),
            service_price_ids: HashMap::new(),
            default_success_url: "https://app.example.com/billing/success".to_string(),
            default_cancel_url: "https://app.example.com/billing/cancel".to_string(),
            default_portal_return_url: "https://app.example.com/account".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Set the price ID for a package plan
    pub fn with_package_price(mut self, tier: Tier, price_id: impl Into<String>) -> Self {
        self.package_price_ids.insert(tier, price_id.into());
        self
    }

    /// Set the price ID for a single-service upgrade
    pub fn with_service_price(mut self, service: Service, price_id: impl Into<String>) -> Self {
        self.service_price_ids.insert(service, price_id.into());
        self
    }

    /// Set the default checkout URLs
    pub fn with_urls(
        mut self,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        self.default_success_url = success_url.into();
        self.default_cancel_url = cancel_url.into();
        self
    }

    /// Set the provider request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Look up the price ID for a checkout item
    pub fn price_id(&self, item: CheckoutItem) -> Option<&str> {
        match item {
            CheckoutItem::Package { tier } => {
                self.package_price_ids.get(&tier).map(String::as_str)
            }
            CheckoutItem::SingleService { service } => {
                self.service_price_ids.get(&service).map(String::as_str)
            }
        }
    }
}
