//! Mock repositories for testing

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use careerpro_db::{
    ConsumeCaps, ConsumeOutcome, CreateUsageEvent, DbError, DbResult, SubscriptionRepository,
    SubscriptionRow, UsageEventRepository, UsageEventRow,
};

fn store_unavailable() -> DbError {
    DbError::Sqlx(sqlx::Error::PoolTimedOut)
}

/// In-memory subscription repository for testing
#[derive(Default, Clone)]
pub struct MockSubscriptionRepository {
    rows: Arc<DashMap<Uuid, SubscriptionRow>>,
    fail: Arc<AtomicBool>,
}

impl MockSubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unreachable store for every subsequent call
    pub fn set_unavailable(&self, unavailable: bool) {
        self.fail.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> DbResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(store_unavailable())
        } else {
            Ok(())
        }
    }

    fn free_row(user_id: Uuid) -> SubscriptionRow {
        SubscriptionRow {
            id: Uuid::new_v4(),
            user_id,
            package_plan: None,
            service_overrides: serde_json::json!({}),
            status: "active".to_string(),
            billing_cycle: "monthly".to_string(),
            stripe_customer_id: None,
            stripe_subscription_id: None,
            current_period_start: Utc::now(),
            current_period_end: Utc::now() + chrono::Duration::days(30),
            cancel_at_period_end: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[async_trait]
impl SubscriptionRepository for MockSubscriptionRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        self.check_available()?;
        Ok(self.rows.get(&user_id).map(|r| r.value().clone()))
    }

    async fn find_by_stripe_subscription_id(
        &self,
        stripe_id: &str,
    ) -> DbResult<Option<SubscriptionRow>> {
        self.check_available()?;
        Ok(self
            .rows
            .iter()
            .find(|r| r.stripe_subscription_id.as_deref() == Some(stripe_id))
            .map(|r| r.value().clone()))
    }

    async fn find_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> DbResult<Option<SubscriptionRow>> {
        self.check_available()?;
        Ok(self
            .rows
            .iter()
            .find(|r| r.stripe_customer_id.as_deref() == Some(customer_id))
            .map(|r| r.value().clone()))
    }

    async fn ensure_exists(&self, user_id: Uuid) -> DbResult<SubscriptionRow> {
        self.check_available()?;
        let row = self
            .rows
            .entry(user_id)
            .or_insert_with(|| Self::free_row(user_id));
        Ok(row.clone())
    }

    async fn activate_package(
        &self,
        user_id: Uuid,
        customer_id: &str,
        subscription_id: Option<&str>,
        plan: &str,
    ) -> DbResult<()> {
        self.check_available()?;
        let mut row = self
            .rows
            .entry(user_id)
            .or_insert_with(|| Self::free_row(user_id));
        row.package_plan = Some(plan.to_string());
        row.status = "active".to_string();
        row.stripe_customer_id = Some(customer_id.to_string());
        if let Some(sub) = subscription_id {
            row.stripe_subscription_id = Some(sub.to_string());
        }
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn activate_service_override(
        &self,
        user_id: Uuid,
        customer_id: &str,
        subscription_id: Option<&str>,
        service: &str,
        tier: &str,
    ) -> DbResult<()> {
        self.check_available()?;
        let mut row = self
            .rows
            .entry(user_id)
            .or_insert_with(|| Self::free_row(user_id));
        row.service_overrides[service] = serde_json::Value::String(tier.to_string());
        row.status = "active".to_string();
        row.stripe_customer_id = Some(customer_id.to_string());
        if let Some(sub) = subscription_id {
            row.stripe_subscription_id = Some(sub.to_string());
        }
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn sync_provider_state(
        &self,
        stripe_subscription_id: &str,
        status: &str,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        cancel_at_period_end: bool,
    ) -> DbResult<()> {
        self.check_available()?;
        for mut row in self.rows.iter_mut() {
            if row.stripe_subscription_id.as_deref() == Some(stripe_subscription_id) {
                row.status = status.to_string();
                row.current_period_start = period_start;
                row.current_period_end = period_end;
                row.cancel_at_period_end = cancel_at_period_end;
                row.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn cancel_by_stripe_subscription_id(&self, stripe_id: &str) -> DbResult<()> {
        self.check_available()?;
        for mut row in self.rows.iter_mut() {
            if row.stripe_subscription_id.as_deref() == Some(stripe_id) {
                row.status = "canceled".to_string();
                row.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn set_status_by_stripe_customer_id(
        &self,
        customer_id: &str,
        status: &str,
    ) -> DbResult<()> {
        self.check_available()?;
        for mut row in self.rows.iter_mut() {
            if row.stripe_customer_id.as_deref() == Some(customer_id) {
                row.status = status.to_string();
                row.updated_at = Utc::now();
            }
        }
        Ok(())
    }
}

/// In-memory usage ledger for testing.
///
/// `append_if_within` holds a mutex across check and insert, matching the
/// advisory-lock transaction of the Postgres implementation.
#[derive(Default, Clone)]
pub struct MockUsageRepository {
    events: Arc<Mutex<Vec<UsageEventRow>>>,
    fail: Arc<AtomicBool>,
}

impl MockUsageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.fail.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> DbResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(store_unavailable())
        } else {
            Ok(())
        }
    }

    /// Insert an event at a fixed instant, for window tests
    pub async fn seed_event(&self, user_id: Uuid, service: &str, occurred_at: DateTime<Utc>) {
        self.events.lock().await.push(UsageEventRow {
            id: Uuid::new_v4(),
            user_id,
            service: service.to_string(),
            count: 1,
            occurred_at,
        });
    }

    pub async fn event_count(&self, user_id: Uuid, service: &str) -> i64 {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| e.user_id == user_id && e.service == service)
            .map(|e| e.count)
            .sum()
    }

    fn sum_since(events: &[UsageEventRow], user_id: Uuid, service: &str, since: DateTime<Utc>) -> i64 {
        events
            .iter()
            .filter(|e| e.user_id == user_id && e.service == service && e.occurred_at >= since)
            .map(|e| e.count)
            .sum()
    }
}

#[async_trait]
impl UsageEventRepository for MockUsageRepository {
    async fn append(&self, event: CreateUsageEvent) -> DbResult<UsageEventRow> {
        self.check_available()?;
        let row = UsageEventRow {
            id: event.id,
            user_id: event.user_id,
            service: event.service,
            count: event.count,
            occurred_at: Utc::now(),
        };
        self.events.lock().await.push(row.clone());
        Ok(row)
    }

    async fn append_if_within(
        &self,
        event: CreateUsageEvent,
        caps: ConsumeCaps,
    ) -> DbResult<ConsumeOutcome> {
        self.check_available()?;
        let mut events = self.events.lock().await;

        let used_hour = caps
            .hourly
            .map(|cap| Self::sum_since(&events, event.user_id, &event.service, cap.since))
            .unwrap_or(0);
        let used_month = caps
            .monthly
            .map(|cap| Self::sum_since(&events, event.user_id, &event.service, cap.since))
            .unwrap_or(0);

        let hourly_ok = caps
            .hourly
            .is_none_or(|cap| used_hour + event.count <= cap.limit);
        let monthly_ok = caps
            .monthly
            .is_none_or(|cap| used_month + event.count <= cap.limit);

        if !(hourly_ok && monthly_ok) {
            return Ok(ConsumeOutcome {
                recorded: false,
                used_hour,
                used_month,
            });
        }

        events.push(UsageEventRow {
            id: event.id,
            user_id: event.user_id,
            service: event.service,
            count: event.count,
            occurred_at: Utc::now(),
        });

        Ok(ConsumeOutcome {
            recorded: true,
            used_hour: used_hour + event.count,
            used_month: used_month + event.count,
        })
    }

    async fn count_since(
        &self,
        user_id: Uuid,
        service: &str,
        since: DateTime<Utc>,
    ) -> DbResult<i64> {
        self.check_available()?;
        let events = self.events.lock().await;
        Ok(Self::sum_since(&events, user_id, service, since))
    }

    async fn total_count(&self, user_id: Uuid, service: &str) -> DbResult<i64> {
        self.check_available()?;
        let events = self.events.lock().await;
        Ok(events
            .iter()
            .filter(|e| e.user_id == user_id && e.service == service)
            .map(|e| e.count)
            .sum())
    }

    async fn active_days(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<NaiveDate>> {
        self.check_available()?;
        let events = self.events.lock().await;
        let mut days: Vec<NaiveDate> = events
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.occurred_at.date_naive())
            .collect();
        days.sort_unstable();
        days.dedup();
        days.reverse();
        days.truncate(limit as usize);
        Ok(days)
    }

    async fn delete_for_user(&self, user_id: Uuid) -> DbResult<u64> {
        self.check_available()?;
        let mut events = self.events.lock().await;
        let before = events.len();
        events.retain(|e| e.user_id != user_id);
        Ok((before - events.len()) as u64)
    }
}
