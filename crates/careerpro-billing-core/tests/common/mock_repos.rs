//! Mock repositories and provider for billing tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use careerpro_billing_core::BillingError;
use careerpro_billing_core::provider::{PaymentProvider, ProviderSubscription};
use careerpro_db::{
    BillingHistoryRepository, BillingHistoryRow, CreateBillingRecord, DbResult,
    SubscriptionRepository, SubscriptionRow, WebhookEventRepository,
};
use careerpro_types::{CheckoutItem, CheckoutSession, PortalSession, UserId};

/// In-memory subscription repository for testing
#[derive(Default, Clone)]
pub struct MockSubscriptionRepository {
    rows: Arc<DashMap<Uuid, SubscriptionRow>>,
}

impl MockSubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(&self, user_id: Uuid) -> Option<SubscriptionRow> {
        self.rows.get(&user_id).map(|r| r.value().clone())
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
        Ok(self.rows.get(&user_id).map(|r| r.value().clone()))
    }

    async fn find_by_stripe_subscription_id(
        &self,
        stripe_id: &str,
    ) -> DbResult<Option<SubscriptionRow>> {
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
        Ok(self
            .rows
            .iter()
            .find(|r| r.stripe_customer_id.as_deref() == Some(customer_id))
            .map(|r| r.value().clone()))
    }

    async fn ensure_exists(&self, user_id: Uuid) -> DbResult<SubscriptionRow> {
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
        for mut row in self.rows.iter_mut() {
            if row.stripe_customer_id.as_deref() == Some(customer_id) {
                row.status = status.to_string();
                row.updated_at = Utc::now();
            }
        }
        Ok(())
    }
}

/// In-memory billing history for testing
#[derive(Default, Clone)]
pub struct MockBillingHistoryRepository {
    rows: Arc<Mutex<Vec<BillingHistoryRow>>>,
}

impl MockBillingHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }
}

#[async_trait]
impl BillingHistoryRepository for MockBillingHistoryRepository {
    async fn append(&self, record: CreateBillingRecord) -> DbResult<bool> {
        let mut rows = self.rows.lock().await;
        if rows
            .iter()
            .any(|r| r.stripe_invoice_id == record.stripe_invoice_id)
        {
            return Ok(false);
        }
        rows.push(BillingHistoryRow {
            id: record.id,
            user_id: record.user_id,
            stripe_invoice_id: record.stripe_invoice_id,
            amount_cents: record.amount_cents,
            currency: record.currency,
            description: record.description,
            period_start: record.period_start,
            period_end: record.period_end,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<BillingHistoryRow>> {
        let rows = self.rows.lock().await;
        let mut out: Vec<BillingHistoryRow> = rows
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out.truncate(limit as usize);
        Ok(out)
    }
}

/// In-memory processed-event set for testing
#[derive(Default, Clone)]
pub struct MockWebhookEventRepository {
    seen: Arc<DashMap<String, String>>,
}

impl MockWebhookEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WebhookEventRepository for MockWebhookEventRepository {
    async fn mark_processed(&self, event_id: &str, event_type: &str) -> DbResult<bool> {
        let inserted = self
            .seen
            .insert(event_id.to_string(), event_type.to_string())
            .is_none();
        Ok(inserted)
    }
}

/// Canned payment provider for testing
#[derive(Clone)]
pub struct MockPaymentProvider {
    pub subscription: Option<ProviderSubscription>,
    pub checkout_calls: Arc<AtomicUsize>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self {
            subscription: None,
            checkout_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_subscription(mut self, sub: ProviderSubscription) -> Self {
        self.subscription = Some(sub);
        self
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_checkout_session(
        &self,
        _user_id: UserId,
        _item: CheckoutItem,
        _success_url: &str,
        _cancel_url: &str,
    ) -> Result<CheckoutSession, BillingError> {
        self.checkout_calls.fetch_add(1, Ordering::SeqCst);
        Ok(CheckoutSession {
            session_id: "cs_test".to_string(),
            url: "https://checkout.stripe.com/test".to_string(),
        })
    }

    async fn create_portal_session(
        &self,
        _customer_id: &str,
        _return_url: &str,
    ) -> Result<PortalSession, BillingError> {
        Ok(PortalSession {
            url: "https://billing.stripe.com/test".to_string(),
        })
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<ProviderSubscription, BillingError> {
        self.subscription
            .clone()
            .filter(|s| s.id == subscription_id)
            .ok_or_else(|| BillingError::Provider("subscription unavailable".to_string()))
    }
}
