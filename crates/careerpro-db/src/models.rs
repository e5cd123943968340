//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.
//! Enum-like columns are stored as text and converted to the closed domain
//! enums in one place, here, so callers never re-validate tier strings.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use careerpro_types::{
    Achievement, AchievementId, BadgeTier, BillingCycle, Requirement, Service, Subscription,
    SubscriptionId, SubscriptionStatus, Tier, UserAchievement, UserId,
};

use crate::error::DbError;

/// Subscription row from the database
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub package_plan: Option<String>,
    pub service_overrides: serde_json::Value,
    pub status: String,
    pub billing_cycle: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub cancel_at_period_end: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionRow {
    /// Convert to the domain subscription, validating stored enum strings.
    pub fn to_domain(&self) -> Result<Subscription, DbError> {
        let package_plan = self
            .package_plan
            .as_deref()
            .map(|s| s.parse::<Tier>())
            .transpose()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        let status = match self.status.as_str() {
            "active" => SubscriptionStatus::Active,
            "past_due" => SubscriptionStatus::PastDue,
            "canceled" => SubscriptionStatus::Canceled,
            other => return Err(DbError::Decode(format!("unknown status: {other}"))),
        };

        let billing_cycle = match self.billing_cycle.as_str() {
            "monthly" => BillingCycle::Monthly,
            "annual" => BillingCycle::Annual,
            other => return Err(DbError::Decode(format!("unknown billing cycle: {other}"))),
        };

        let mut service_overrides = HashMap::new();
        if let Some(map) = self.service_overrides.as_object() {
            for (key, value) in map {
                let service: Service = key
                    .parse()
                    .map_err(|_| DbError::Decode(format!("unknown service: {key}")))?;
                let tier: Tier = value
                    .as_str()
                    .ok_or_else(|| DbError::Decode("override tier is not a string".into()))?
                    .parse()
                    .map_err(|_| DbError::Decode(format!("unknown override tier: {value}")))?;
                service_overrides.insert(service, tier);
            }
        }

        Ok(Subscription {
            id: SubscriptionId(self.id),
            user_id: UserId(self.user_id),
            package_plan,
            service_overrides,
            status,
            billing_cycle,
            stripe_customer_id: self.stripe_customer_id.clone(),
            stripe_subscription_id: self.stripe_subscription_id.clone(),
            current_period_start: self.current_period_start,
            current_period_end: self.current_period_end,
            cancel_at_period_end: self.cancel_at_period_end,
            created_at: self.created_at,
        })
    }
}

/// Usage ledger row
#[derive(Debug, Clone, FromRow)]
pub struct UsageEventRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service: String,
    pub count: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Achievement definition row
#[derive(Debug, Clone, FromRow)]
pub struct AchievementRow {
    pub id: Uuid,
    pub category: String,
    pub title: String,
    pub requirement: serde_json::Value,
    pub points: i32,
    pub tier: String,
}

impl AchievementRow {
    /// Convert to the domain achievement, validating the requirement JSON.
    pub fn to_domain(&self) -> Result<Achievement, DbError> {
        let requirement: Requirement = serde_json::from_value(self.requirement.clone())
            .map_err(|e| DbError::Decode(format!("bad requirement: {e}")))?;

        let tier = match self.tier.as_str() {
            "bronze" => BadgeTier::Bronze,
            "silver" => BadgeTier::Silver,
            "gold" => BadgeTier::Gold,
            other => return Err(DbError::Decode(format!("unknown badge tier: {other}"))),
        };

        Ok(Achievement {
            id: AchievementId(self.id),
            category: self.category.clone(),
            title: self.title.clone(),
            requirement,
            points: self.points as u32,
            tier,
        })
    }
}

/// User achievement progress row
#[derive(Debug, Clone, FromRow)]
pub struct UserAchievementRow {
    pub user_id: Uuid,
    pub achievement_id: Uuid,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub progress: i32,
}

impl UserAchievementRow {
    /// Convert to the domain progress record
    pub fn to_domain(&self) -> UserAchievement {
        UserAchievement {
            achievement_id: AchievementId(self.achievement_id),
            completed: self.completed,
            completed_at: self.completed_at,
            progress: self.progress,
        }
    }
}

/// Billing history row
#[derive(Debug, Clone, FromRow)]
pub struct BillingHistoryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub stripe_invoice_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub description: Option<String>,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Notification preferences row; a missing row means all defaults (opted in)
#[derive(Debug, Clone, FromRow)]
pub struct NotificationPrefsRow {
    pub user_id: Uuid,
    pub product_updates: bool,
    pub usage_alerts: bool,
    pub billing_alerts: bool,
    pub updated_at: DateTime<Utc>,
}
