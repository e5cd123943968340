//! Subscription types

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Service, Tier, UserId};

/// Unique subscription identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub Uuid);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Subscription is active
    Active,
    /// Payment is past due
    PastDue,
    /// Subscription was canceled
    Canceled,
}

impl SubscriptionStatus {
    /// Get the status string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
        }
    }

    /// Map a payment-provider status string onto our closed set.
    ///
    /// Anything the provider reports that is not active or past due
    /// (incomplete, unpaid, paused, ...) entitles the user to nothing,
    /// so it collapses to canceled.
    pub fn from_provider(s: &str) -> Self {
        match s {
            "active" | "trialing" => Self::Active,
            "past_due" => Self::PastDue,
            _ => Self::Canceled,
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Billing cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    /// Billed every month
    Monthly,
    /// Billed once a year
    Annual,
}

impl BillingCycle {
    /// Get the cycle string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Annual => "annual",
        }
    }
}

/// Per-user subscription state.
///
/// Created at signup with Free defaults and mutated exclusively by
/// payment-provider webhook events; everything else reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscription ID
    pub id: SubscriptionId,
    /// User who owns the subscription
    pub user_id: UserId,
    /// Package plan covering all services, if purchased
    pub package_plan: Option<Tier>,
    /// Single-service tier overrides, consulted when no package plan is set
    pub service_overrides: HashMap<Service, Tier>,
    /// Subscription status
    pub status: SubscriptionStatus,
    /// Billing cycle
    pub billing_cycle: BillingCycle,
    /// Stripe customer ID (set on first checkout)
    pub stripe_customer_id: Option<String>,
    /// Stripe subscription ID (set on first checkout)
    pub stripe_subscription_id: Option<String>,
    /// Current billing period start
    pub current_period_start: DateTime<Utc>,
    /// Current billing period end
    pub current_period_end: DateTime<Utc>,
    /// Whether the subscription cancels at period end
    pub cancel_at_period_end: bool,
    /// When the subscription was created
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// Resolve the tier that governs `service` for this user.
    ///
    /// Precedence: package plan, then the per-service override, then Free.
    /// Any status other than Active degrades the whole subscription to
    /// Free-tier entitlements.
    pub fn effective_tier(&self, service: Service) -> Tier {
        if self.status != SubscriptionStatus::Active {
            return Tier::Free;
        }
        if let Some(plan) = self.package_plan {
            return plan;
        }
        self.service_overrides
            .get(&service)
            .copied()
            .unwrap_or(Tier::Free)
    }
}
