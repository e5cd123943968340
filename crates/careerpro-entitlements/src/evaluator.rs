//! Rate/usage evaluator
//!
//! Answers allowance questions for a (user, service) pair and records
//! consumption. Gating paths fail closed when the store is unreachable;
//! display paths fail open so the UI shows nothing instead of blocking.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{instrument, warn};
use uuid::Uuid;

use careerpro_db::{
    ConsumeCaps, CreateUsageEvent, SubscriptionRepository, UsageEventRepository, WindowCap,
};
use careerpro_types::{Allowance, Limit, QuotaWindow, Service, Tier, UserId};

use crate::catalog::PlanCatalog;
use crate::error::EntitlementError;

/// Outcome of an atomic authorize-and-record attempt
#[derive(Debug, Clone, Copy)]
pub struct ConsumeResult {
    /// Whether a usage event was recorded (the action may proceed)
    pub recorded: bool,
    /// Monthly units remaining after the attempt; `None` means unlimited
    pub remaining: Option<u32>,
    /// Reset time of the window that produced this result
    pub resets_at: DateTime<Utc>,
}

/// Evaluates allowances against subscription state and the usage ledger
pub struct UsageEvaluator {
    catalog: Arc<PlanCatalog>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    usage: Arc<dyn UsageEventRepository>,
}

impl UsageEvaluator {
    /// Create a new evaluator
    pub fn new(
        catalog: Arc<PlanCatalog>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        usage: Arc<dyn UsageEventRepository>,
    ) -> Self {
        Self {
            catalog,
            subscriptions,
            usage,
        }
    }

    /// Resolve the tier governing `service` for this user.
    ///
    /// No subscription row means Free; a non-active subscription degrades
    /// to Free inside `Subscription::effective_tier`.
    pub async fn effective_tier(
        &self,
        user: UserId,
        service: Service,
    ) -> Result<Tier, EntitlementError> {
        match self.subscriptions.find_by_user_id(user.0).await? {
            Some(row) => Ok(row.to_domain()?.effective_tier(service)),
            None => Ok(Tier::Free),
        }
    }

    /// Compute the allowance for one window.
    ///
    /// Unlimited limits short-circuit without touching the ledger; several
    /// paid tiers set tool limits to unlimited, so this path is hot.
    #[instrument(skip(self), fields(user = %user, service = %service, window = %window))]
    pub async fn check(
        &self,
        user: UserId,
        service: Service,
        window: QuotaWindow,
    ) -> Result<Allowance, EntitlementError> {
        let now = Utc::now();
        let tier = self.effective_tier(user, service).await?;

        match self.catalog.resolve(service, tier, window) {
            Limit::Unlimited => Ok(Allowance::unlimited(now, window)),
            Limit::Finite(cap) => {
                let used = self
                    .usage
                    .count_since(user.0, service.as_str(), window.start(now))
                    .await?;
                Ok(Allowance::finite(cap, used, now, window))
            }
        }
    }

    /// Gating check for an action. Fails closed: a store error denies.
    ///
    /// The hourly throttle is consulted first; if it permits, the monthly
    /// allowance is the answer.
    pub async fn gate(&self, user: UserId, service: Service) -> Allowance {
        match self.check(user, service, QuotaWindow::Hourly).await {
            Ok(hourly) if !hourly.allowed => hourly,
            Ok(_) => match self.check(user, service, QuotaWindow::Monthly).await {
                Ok(monthly) => monthly,
                Err(e) => {
                    warn!(error = %e, user = %user, service = %service, "allowance check failed, denying");
                    Allowance::denied(Utc::now(), QuotaWindow::Monthly)
                }
            },
            Err(e) => {
                warn!(error = %e, user = %user, service = %service, "allowance check failed, denying");
                Allowance::denied(Utc::now(), QuotaWindow::Hourly)
            }
        }
    }

    /// Display-only remaining count. Fails open: a store error yields
    /// `None` and the caller shows nothing.
    pub async fn display(&self, user: UserId, service: Service) -> Option<Allowance> {
        match self.check(user, service, QuotaWindow::Monthly).await {
            Ok(allowance) => Some(allowance),
            Err(e) => {
                warn!(error = %e, user = %user, service = %service, "allowance display query failed");
                None
            }
        }
    }

    /// Atomically authorize one unit of work and record it.
    ///
    /// The ledger performs the check and the append under one lock, so two
    /// concurrent calls at the last remaining unit cannot both record.
    #[instrument(skip(self), fields(user = %user, service = %service))]
    pub async fn authorize_and_record(
        &self,
        user: UserId,
        service: Service,
    ) -> Result<ConsumeResult, EntitlementError> {
        let now = Utc::now();
        let tier = self.effective_tier(user, service).await?;

        let hourly = self.catalog.resolve(service, tier, QuotaWindow::Hourly);
        let monthly = self.catalog.resolve(service, tier, QuotaWindow::Monthly);

        let caps = ConsumeCaps {
            hourly: hourly.cap().map(|limit| WindowCap {
                since: QuotaWindow::Hourly.start(now),
                limit: i64::from(limit),
            }),
            monthly: monthly.cap().map(|limit| WindowCap {
                since: QuotaWindow::Monthly.start(now),
                limit: i64::from(limit),
            }),
        };

        let event = CreateUsageEvent {
            id: Uuid::new_v4(),
            user_id: user.0,
            service: service.as_str().to_string(),
            count: 1,
        };

        let outcome = self.usage.append_if_within(event, caps).await?;

        if !outcome.recorded {
            if let Some(cap) = monthly.cap() {
                if outcome.used_month + 1 > i64::from(cap) {
                    return Ok(denied_result(cap, outcome.used_month, now, QuotaWindow::Monthly));
                }
            }
            if let Some(cap) = hourly.cap() {
                return Ok(denied_result(cap, outcome.used_hour, now, QuotaWindow::Hourly));
            }
            return Ok(ConsumeResult {
                recorded: false,
                remaining: Some(0),
                resets_at: now + QuotaWindow::Hourly.duration(),
            });
        }

        Ok(ConsumeResult {
            recorded: true,
            remaining: monthly
                .cap()
                .map(|cap| (i64::from(cap) - outcome.used_month).max(0) as u32),
            resets_at: now + QuotaWindow::Monthly.duration(),
        })
    }

    /// Append one usage event without gating, for callers authorized
    /// out-of-band.
    pub async fn record(&self, user: UserId, service: Service) -> Result<(), EntitlementError> {
        self.usage
            .append(CreateUsageEvent {
                id: Uuid::new_v4(),
                user_id: user.0,
                service: service.as_str().to_string(),
                count: 1,
            })
            .await?;
        Ok(())
    }
}

fn denied_result(cap: u32, used: i64, now: DateTime<Utc>, window: QuotaWindow) -> ConsumeResult {
    ConsumeResult {
        recorded: false,
        remaining: Some((i64::from(cap) - used).max(0) as u32),
        resets_at: now + window.duration(),
    }
}
