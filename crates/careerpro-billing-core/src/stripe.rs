//! Stripe payment provider implementation

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, instrument, warn};

use careerpro_types::{CheckoutItem, CheckoutSession, PortalSession, UserId};

use crate::config::BillingConfig;
use crate::error::BillingError;
use crate::provider::{PaymentProvider, ProviderSubscription};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Attempts for idempotent GET requests (initial try included)
const GET_ATTEMPTS: u32 = 3;
/// Fixed delay between GET retries
const RETRY_DELAY: std::time::Duration = std::time::Duration::from_millis(500);

/// Stripe payment provider
#[derive(Clone)]
pub struct StripeProvider {
    client: Client,
    config: BillingConfig,
}

impl StripeProvider {
    /// Create a new Stripe provider
    pub fn new(config: BillingConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    /// POST a form to Stripe. Never retried: creates are side-effecting
    /// and we attach no idempotency key.
    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        form: &[(&str, &str)],
    ) -> Result<T, BillingError> {
        let url = format!("{STRIPE_API_BASE}{endpoint}");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.stripe_secret_key, Option::<&str>::None)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, endpoint, "Stripe request failed");
                BillingError::Provider(e.to_string())
            })?;

        Self::decode(response).await
    }

    /// GET from Stripe with a fixed-delay retry on 5xx and transport
    /// errors. Reads are idempotent, so this is safe.
    async fn get_with_retry<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
    ) -> Result<T, BillingError> {
        let url = format!("{STRIPE_API_BASE}{endpoint}");
        let mut last_err = None;

        for attempt in 0..GET_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(RETRY_DELAY).await;
            }

            let result = self
                .client
                .get(&url)
                .basic_auth(&self.config.stripe_secret_key, Option::<&str>::None)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_server_error() => {
                    warn!(status = %response.status(), endpoint, attempt, "Stripe 5xx, retrying");
                    last_err = Some(BillingError::Provider(format!(
                        "Stripe API error: {}",
                        response.status()
                    )));
                }
                Ok(response) => return Self::decode(response).await,
                Err(e) => {
                    warn!(error = %e, endpoint, attempt, "Stripe request failed, retrying");
                    last_err = Some(BillingError::Provider(e.to_string()));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| BillingError::Internal("retry loop exhausted".into())))
    }

    async fn decode<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, BillingError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Stripe API error");
            return Err(BillingError::Provider(format!("Stripe API error: {status}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BillingError::Internal(e.to_string()))
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    #[instrument(skip(self))]
    async fn create_checkout_session(
        &self,
        user_id: UserId,
        item: CheckoutItem,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, BillingError> {
        debug!(user_id = %user_id, "Creating checkout session");

        let price_id = self
            .config
            .price_id(item)
            .ok_or_else(|| BillingError::PriceNotConfigured(format!("{item:?}")))?
            .to_string();

        let reference = user_id.to_string();
        let mut form: Vec<(&str, &str)> = vec![
            ("mode", "subscription"),
            ("client_reference_id", &reference),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
            ("line_items[0][price]", &price_id),
            ("line_items[0][quantity]", "1"),
        ];

        // The completion webhook reads these back to know what to activate
        match item {
            CheckoutItem::Package { tier } => form.push(("metadata[plan]", tier.as_str())),
            CheckoutItem::SingleService { service } => {
                form.push(("metadata[service]", service.as_str()));
            }
        }

        let session: RawCheckoutSession = self.post_form("/checkout/sessions", &form).await?;

        Ok(CheckoutSession {
            session_id: session.id,
            url: session.url.unwrap_or_default(),
        })
    }

    #[instrument(skip(self))]
    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, BillingError> {
        debug!(customer_id = %customer_id, "Creating portal session");

        let form = [("customer", customer_id), ("return_url", return_url)];
        let session: RawPortalSession = self.post_form("/billing_portal/sessions", &form).await?;

        Ok(PortalSession { url: session.url })
    }

    #[instrument(skip(self))]
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<ProviderSubscription, BillingError> {
        debug!(subscription_id = %subscription_id, "Fetching subscription");

        let sub: RawSubscription = self
            .get_with_retry(&format!("/subscriptions/{subscription_id}"))
            .await?;

        Ok(ProviderSubscription {
            id: sub.id,
            customer_id: sub.customer,
            status: sub.status,
            period_start: Utc
                .timestamp_opt(sub.current_period_start, 0)
                .single()
                .unwrap_or_else(Utc::now),
            period_end: Utc
                .timestamp_opt(sub.current_period_end, 0)
                .single()
                .unwrap_or_else(Utc::now),
            cancel_at_period_end: sub.cancel_at_period_end,
        })
    }
}

// Raw Stripe response shapes

#[derive(Debug, Deserialize)]
struct RawCheckoutSession {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPortalSession {
    url: String,
}

#[derive(Debug, Deserialize)]
struct RawSubscription {
    id: String,
    customer: String,
    status: String,
    current_period_start: i64,
    current_period_end: i64,
    #[serde(default)]
    cancel_at_period_end: bool,
}
