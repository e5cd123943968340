//! PostgreSQL repository implementations

mod achievement;
mod billing_history;
mod notification;
mod subscription;
mod usage;
mod webhook_event;

pub use achievement::PgAchievementRepository;
pub use billing_history::PgBillingHistoryRepository;
pub use notification::PgNotificationPreferenceRepository;
pub use subscription::PgSubscriptionRepository;
pub use usage::PgUsageEventRepository;
pub use webhook_event::PgWebhookEventRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub subscriptions: PgSubscriptionRepository,
    pub usage: PgUsageEventRepository,
    pub achievements: PgAchievementRepository,
    pub billing_history: PgBillingHistoryRepository,
    pub webhook_events: PgWebhookEventRepository,
    pub notification_prefs: PgNotificationPreferenceRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            subscriptions: PgSubscriptionRepository::new(pool.clone()),
            usage: PgUsageEventRepository::new(pool.clone()),
            achievements: PgAchievementRepository::new(pool.clone()),
            billing_history: PgBillingHistoryRepository::new(pool.clone()),
            webhook_events: PgWebhookEventRepository::new(pool.clone()),
            notification_prefs: PgNotificationPreferenceRepository::new(pool),
        }
    }
}
