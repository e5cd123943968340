//! Billing and payment types

use serde::{Deserialize, Serialize};

use crate::{Service, Tier};

/// What a checkout session purchases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckoutItem {
    /// A package plan covering every service
    Package { tier: Tier },
    /// A single-service upgrade (granted at Pro level)
    SingleService { service: Service },
}

/// Checkout session response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Stripe checkout session ID
    pub session_id: String,
    /// Checkout URL to redirect the user to
    pub url: String,
}

/// Customer portal session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalSession {
    /// Portal session URL
    pub url: String,
}
