//! Application state for the CareerPro API service.

use std::sync::Arc;

use careerpro_achievements::AchievementEvaluator;
use careerpro_billing_core::{BillingService, StripeProvider};
use careerpro_db::DbPool;
use careerpro_db::pg::Repositories;
use careerpro_email::{EmailService, TemplateSet};
use careerpro_entitlements::UsageEvaluator;

use crate::config::Config;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Allowance evaluation and usage recording
    pub evaluator: Arc<UsageEvaluator>,
    /// Achievement evaluation
    pub achievements: Arc<AchievementEvaluator>,
    /// Subscription sync, checkout and portal
    pub billing: Arc<BillingService>,
    /// Outbound templated email
    pub email: Arc<EmailService>,
    /// Database repositories (for direct reads)
    pub repos: Repositories,
    /// Database pool (readiness probe)
    pub pool: DbPool,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire every service from the pool and configuration.
    ///
    /// This is the composition root: repositories and service instances
    /// are constructed once here and shared behind `Arc`s.
    pub fn new(pool: DbPool, config: Config) -> Self {
        let repos = Repositories::new(pool.clone());

        let evaluator = UsageEvaluator::new(
            config.catalog.clone(),
            Arc::new(repos.subscriptions.clone()),
            Arc::new(repos.usage.clone()),
        );

        let achievements = AchievementEvaluator::new(
            Arc::new(repos.achievements.clone()),
            Arc::new(repos.usage.clone()),
        );

        let billing = BillingService::new(
            Arc::new(StripeProvider::new(config.billing.clone())),
            config.billing.clone(),
            Arc::new(repos.subscriptions.clone()),
            Arc::new(repos.billing_history.clone()),
            Arc::new(repos.webhook_events.clone()),
        );

        let email = EmailService::new(
            config.email.clone(),
            TemplateSet::builtin(),
            Arc::new(repos.notification_prefs.clone()),
        );

        Self {
            evaluator: Arc::new(evaluator),
            achievements: Arc::new(achievements),
            billing: Arc::new(billing),
            email: Arc::new(email),
            repos,
            pool,
            config: Arc::new(config),
        }
    }

    /// Get the request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
