//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// Subscription repository trait
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find the subscription for a user (one row per user)
    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Find a subscription by Stripe subscription ID
    async fn find_by_stripe_subscription_id(&self, stripe_id: &str)
    -> DbResult<Option<SubscriptionRow>>;

    /// Find a subscription by Stripe customer ID
    async fn find_by_stripe_customer_id(&self, customer_id: &str)
    -> DbResult<Option<SubscriptionRow>>;

    /// Create the implicit Free-tier row for a user if none exists yet
    async fn ensure_exists(&self, user_id: Uuid) -> DbResult<SubscriptionRow>;

    /// Checkout completed for a package plan: store provider IDs, set the
    /// plan and activate
    async fn activate_package(
        &self,
        user_id: Uuid,
        customer_id: &str,
        subscription_id: Option<&str>,
        plan: &str,
    ) -> DbResult<()>;

    /// Checkout completed for a single service: store provider IDs, set the
    /// per-service override and activate
    async fn activate_service_override(
        &self,
        user_id: Uuid,
        customer_id: &str,
        subscription_id: Option<&str>,
        service: &str,
        tier: &str,
    ) -> DbResult<()>;

    /// Apply provider-reported status and period bounds
    async fn sync_provider_state(
        &self,
        stripe_subscription_id: &str,
        status: &str,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        cancel_at_period_end: bool,
    ) -> DbResult<()>;

    /// Cancel the subscription identified by a Stripe subscription ID
    async fn cancel_by_stripe_subscription_id(&self, stripe_id: &str) -> DbResult<()>;

    /// Set the status of the subscription owned by a Stripe customer
    async fn set_status_by_stripe_customer_id(
        &self,
        customer_id: &str,
        status: &str,
    ) -> DbResult<()>;
}

/// One window's cap for a conditional append
#[derive(Debug, Clone, Copy)]
pub struct WindowCap {
    /// Events at or after this instant count against the cap
    pub since: DateTime<Utc>,
    /// Maximum events allowed in the window, inclusive of the new one
    pub limit: i64,
}

/// Caps applied by `append_if_within`; `None` means unlimited (no check)
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsumeCaps {
    pub hourly: Option<WindowCap>,
    pub monthly: Option<WindowCap>,
}

/// Result of a conditional append
#[derive(Debug, Clone, Copy)]
pub struct ConsumeOutcome {
    /// Whether the event was recorded
    pub recorded: bool,
    /// Events in the hourly window after the attempt (0 if uncapped)
    pub used_hour: i64,
    /// Events in the monthly window after the attempt (0 if uncapped)
    pub used_month: i64,
}

/// Create usage event input
#[derive(Debug, Clone)]
pub struct CreateUsageEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service: String,
    pub count: i64,
}

/// Usage ledger repository trait
#[async_trait]
pub trait UsageEventRepository: Send + Sync {
    /// Append one event unconditionally
    async fn append(&self, event: CreateUsageEvent) -> DbResult<UsageEventRow>;

    /// Append one event only if every given window cap still permits it.
    ///
    /// Check and insert happen under a per-(user, service) lock in a single
    /// transaction, so concurrent callers at the limit boundary cannot both
    /// record.
    async fn append_if_within(
        &self,
        event: CreateUsageEvent,
        caps: ConsumeCaps,
    ) -> DbResult<ConsumeOutcome>;

    /// Sum of event counts for (user, service) at or after `since`
    async fn count_since(
        &self,
        user_id: Uuid,
        service: &str,
        since: DateTime<Utc>,
    ) -> DbResult<i64>;

    /// Lifetime sum of event counts for (user, service)
    async fn total_count(&self, user_id: Uuid, service: &str) -> DbResult<i64>;

    /// Distinct calendar days with at least one event, newest first
    async fn active_days(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<NaiveDate>>;

    /// Remove all ledger rows for a user (account deletion only)
    async fn delete_for_user(&self, user_id: Uuid) -> DbResult<u64>;
}

/// Achievement repository trait
#[async_trait]
pub trait AchievementRepository: Send + Sync {
    /// Achievements in a category the user has not completed yet
    async fn find_incomplete_by_category(
        &self,
        user_id: Uuid,
        category: &str,
    ) -> DbResult<Vec<AchievementRow>>;

    /// Mark an achievement completed; returns false if it already was.
    ///
    /// Idempotent: `completed_at` is set exactly once.
    async fn mark_completed(&self, user_id: Uuid, achievement_id: Uuid) -> DbResult<bool>;

    /// Record partial progress toward an incomplete achievement
    async fn set_progress(&self, user_id: Uuid, achievement_id: Uuid, progress: i32)
    -> DbResult<()>;

    /// All completed achievements for a user
    async fn find_completed(&self, user_id: Uuid) -> DbResult<Vec<UserAchievementRow>>;
}

/// Create billing record input
#[derive(Debug, Clone)]
pub struct CreateBillingRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub stripe_invoice_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub description: Option<String>,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

/// Billing history repository trait
#[async_trait]
pub trait BillingHistoryRepository: Send + Sync {
    /// Append a record; returns false when the invoice was already recorded
    async fn append(&self, record: CreateBillingRecord) -> DbResult<bool>;

    /// Newest records first
    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<BillingHistoryRow>>;
}

/// Processed-webhook-event set, used to drop provider replays
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Record a provider event ID; returns false if it was seen before
    async fn mark_processed(&self, event_id: &str, event_type: &str) -> DbResult<bool>;
}

/// Notification preference repository trait
#[async_trait]
pub trait NotificationPreferenceRepository: Send + Sync {
    /// Preferences for a user; `None` means never customized (all opted in)
    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Option<NotificationPrefsRow>>;
}
