//! Billing service
//!
//! The only writer of subscription state. Webhook events are verified,
//! de-duplicated by provider event ID and then applied 1:1 to the
//! subscription row; checkout and portal sessions are pass-through calls
//! to the payment provider.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use careerpro_db::{
    BillingHistoryRepository, BillingHistoryRow, CreateBillingRecord, SubscriptionRepository,
    WebhookEventRepository,
};
use careerpro_types::{
    CheckoutItem, CheckoutSession, PortalSession, Subscription, SubscriptionStatus, Tier, UserId,
};

use crate::config::BillingConfig;
use crate::error::BillingError;
use crate::provider::PaymentProvider;
use crate::webhook::{
    CheckoutEventData, InvoiceEventData, SubscriptionEventData, WebhookEvent, WebhookEventData,
    WebhookEventKind, WebhookVerifier,
};

/// Billing service
pub struct BillingService {
    provider: Arc<dyn PaymentProvider>,
    verifier: WebhookVerifier,
    config: BillingConfig,
    subscriptions: Arc<dyn SubscriptionRepository>,
    history: Arc<dyn BillingHistoryRepository>,
    processed_events: Arc<dyn WebhookEventRepository>,
}

impl BillingService {
    /// Create a new billing service
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        config: BillingConfig,
        subscriptions: Arc<dyn SubscriptionRepository>,
        history: Arc<dyn BillingHistoryRepository>,
        processed_events: Arc<dyn WebhookEventRepository>,
    ) -> Self {
        let verifier = WebhookVerifier::new(&config.stripe_webhook_secret);
        Self {
            provider,
            verifier,
            config,
            subscriptions,
            history,
            processed_events,
        }
    }

    /// Get (and lazily create) the subscription for a user
    pub async fn get_subscription(&self, user: UserId) -> Result<Subscription, BillingError> {
        let row = self.subscriptions.ensure_exists(user.0).await?;
        Ok(row.to_domain()?)
    }

    /// Create a checkout session for a package plan or single service
    #[instrument(skip(self))]
    pub async fn create_checkout(
        &self,
        user: UserId,
        item: CheckoutItem,
        success_url: Option<&str>,
        cancel_url: Option<&str>,
    ) -> Result<CheckoutSession, BillingError> {
        if self.config.price_id(item).is_none() {
            return Err(BillingError::PriceNotConfigured(format!("{item:?}")));
        }

        // Make sure the row exists so the completion webhook has a target
        self.subscriptions.ensure_exists(user.0).await?;

        self.provider
            .create_checkout_session(
                user,
                item,
                success_url.unwrap_or(&self.config.default_success_url),
                cancel_url.unwrap_or(&self.config.default_cancel_url),
            )
            .await
    }

    /// Create a billing-portal session for an existing customer
    #[instrument(skip(self))]
    pub async fn create_portal(
        &self,
        user: UserId,
        return_url: Option<&str>,
    ) -> Result<PortalSession, BillingError> {
        let row = self
            .subscriptions
            .find_by_user_id(user.0)
            .await?
            .ok_or(BillingError::SubscriptionNotFound)?;

        let customer_id = row
            .stripe_customer_id
            .as_deref()
            .ok_or(BillingError::CustomerNotFound)?;

        self.provider
            .create_portal_session(
                customer_id,
                return_url.unwrap_or(&self.config.default_portal_return_url),
            )
            .await
    }

    /// Billing history for a user, newest first
    pub async fn billing_history(
        &self,
        user: UserId,
        limit: i64,
    ) -> Result<Vec<BillingHistoryRow>, BillingError> {
        Ok(self.history.list_for_user(user.0, limit).await?)
    }

    /// Verify, de-duplicate and apply one webhook delivery.
    ///
    /// Replayed events (same provider event ID) are dropped before any
    /// state is touched, so provider retries cannot double-apply.
    #[instrument(skip(self, payload, signature_header))]
    pub async fn process_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<(), BillingError> {
        let event = self.verifier.verify_and_parse(payload, signature_header)?;

        let first_delivery = self
            .processed_events
            .mark_processed(&event.id, event.kind.as_str())
            .await?;
        if !first_delivery {
            debug!(event_id = %event.id, "webhook replay dropped");
            return Ok(());
        }

        self.apply(event).await
    }

    async fn apply(&self, event: WebhookEvent) -> Result<(), BillingError> {
        match (&event.kind, event.data) {
            (WebhookEventKind::CheckoutCompleted, WebhookEventData::Checkout(data)) => {
                self.apply_checkout_completed(data).await
            }
            (WebhookEventKind::SubscriptionUpdated, WebhookEventData::Subscription(data)) => {
                self.apply_subscription_updated(data).await
            }
            (WebhookEventKind::SubscriptionDeleted, WebhookEventData::Subscription(data)) => {
                self.apply_subscription_deleted(data).await
            }
            (WebhookEventKind::InvoicePaid, WebhookEventData::Invoice(data)) => {
                self.apply_invoice_paid(data).await
            }
            (WebhookEventKind::InvoicePaymentFailed, WebhookEventData::Invoice(data)) => {
                self.apply_invoice_failed(data).await
            }
            (WebhookEventKind::Unknown(_), _) => Ok(()),
            (kind, _) => Err(BillingError::Internal(format!(
                "event data mismatch for {}",
                kind.as_str()
            ))),
        }
    }

    async fn apply_checkout_completed(
        &self,
        data: CheckoutEventData,
    ) -> Result<(), BillingError> {
        let Some(reference) = data.client_reference_id.as_deref() else {
            warn!(session_id = %data.session_id, "checkout completed without client reference");
            return Ok(());
        };
        let user_id = Uuid::parse_str(reference)
            .map_err(|_| BillingError::Webhook(format!("bad client reference: {reference}")))?;

        let Some(customer_id) = data.customer_id.as_deref() else {
            warn!(session_id = %data.session_id, "checkout completed without customer");
            return Ok(());
        };

        if let Some(plan) = data.metadata.get("plan") {
            // Validate at the boundary; a typo in the price metadata must
            // not end up stored as a tier string.
            let tier: Tier = plan
                .parse()
                .map_err(|_| BillingError::Webhook(format!("bad plan metadata: {plan}")))?;
            self.subscriptions
                .activate_package(
                    user_id,
                    customer_id,
                    data.subscription_id.as_deref(),
                    tier.as_str(),
                )
                .await?;
            info!(user_id = %user_id, plan = %tier, "package plan activated");
        } else if let Some(service) = data.metadata.get("service") {
            let service: careerpro_types::Service = service
                .parse()
                .map_err(|_| BillingError::Webhook(format!("bad service metadata: {service}")))?;
            self.subscriptions
                .activate_service_override(
                    user_id,
                    customer_id,
                    data.subscription_id.as_deref(),
                    service.as_str(),
                    Tier::Pro.as_str(),
                )
                .await?;
            info!(user_id = %user_id, service = %service, "single-service upgrade activated");
        } else {
            warn!(session_id = %data.session_id, "checkout completed without purchase metadata");
            return Ok(());
        }

        // Pull period bounds from the provider; best effort, the next
        // subscription.updated event carries them too.
        if let Some(subscription_id) = data.subscription_id.as_deref() {
            match self.provider.get_subscription(subscription_id).await {
                Ok(sub) => {
                    self.subscriptions
                        .sync_provider_state(
                            subscription_id,
                            SubscriptionStatus::from_provider(&sub.status).as_str(),
                            sub.period_start,
                            sub.period_end,
                            sub.cancel_at_period_end,
                        )
                        .await?;
                }
                Err(e) => {
                    warn!(error = %e, subscription_id, "could not fetch subscription after checkout");
                }
            }
        }

        Ok(())
    }

    async fn apply_subscription_updated(
        &self,
        data: SubscriptionEventData,
    ) -> Result<(), BillingError> {
        let status = SubscriptionStatus::from_provider(&data.status);
        self.subscriptions
            .sync_provider_state(
                &data.subscription_id,
                status.as_str(),
                data.period_start,
                data.period_end,
                data.cancel_at_period_end,
            )
            .await?;

        info!(
            subscription_id = %data.subscription_id,
            status = %status,
            cancel_at_period_end = data.cancel_at_period_end,
            "subscription state synced"
        );
        Ok(())
    }

    async fn apply_subscription_deleted(
        &self,
        data: SubscriptionEventData,
    ) -> Result<(), BillingError> {
        self.subscriptions
            .cancel_by_stripe_subscription_id(&data.subscription_id)
            .await?;
        info!(subscription_id = %data.subscription_id, "subscription canceled");
        Ok(())
    }

    async fn apply_invoice_paid(&self, data: InvoiceEventData) -> Result<(), BillingError> {
        // Status is deliberately untouched: payment success is recorded,
        // activation comes from the subscription events.
        let Some(row) = self
            .subscriptions
            .find_by_stripe_customer_id(&data.customer_id)
            .await?
        else {
            warn!(customer_id = %data.customer_id, "invoice paid for unknown customer");
            return Ok(());
        };

        let appended = self
            .history
            .append(CreateBillingRecord {
                id: Uuid::new_v4(),
                user_id: row.user_id,
                stripe_invoice_id: data.invoice_id.clone(),
                amount_cents: data.amount_cents,
                currency: data.currency,
                description: None,
                period_start: data.period_start,
                period_end: data.period_end,
            })
            .await?;

        if appended {
            info!(invoice_id = %data.invoice_id, amount_cents = data.amount_cents, "billing history recorded");
        } else {
            debug!(invoice_id = %data.invoice_id, "invoice already recorded");
        }
        Ok(())
    }

    async fn apply_invoice_failed(&self, data: InvoiceEventData) -> Result<(), BillingError> {
        self.subscriptions
            .set_status_by_stripe_customer_id(
                &data.customer_id,
                SubscriptionStatus::PastDue.as_str(),
            )
            .await?;
        warn!(customer_id = %data.customer_id, invoice_id = %data.invoice_id, "invoice payment failed, subscription past due");
        Ok(())
    }
}
