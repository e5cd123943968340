//! Stripe webhook verification and parsing
//!
//! Signature scheme: the `Stripe-Signature` header carries
//! `t=<unix>,v1=<hex hmac>` where the HMAC-SHA256 is computed over
//! `"<t>.<raw body>"` with the webhook signing secret. Verification is
//! constant-time and rejects timestamps older than five minutes.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, info, warn};

use crate::error::BillingError;

/// Maximum accepted age of a webhook timestamp, in seconds
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Webhook event kinds we act on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventKind {
    /// Checkout session completed
    CheckoutCompleted,
    /// Subscription created or updated by the provider
    SubscriptionUpdated,
    /// Subscription deleted
    SubscriptionDeleted,
    /// Invoice paid
    InvoicePaid,
    /// Invoice payment failed
    InvoicePaymentFailed,
    /// Anything else; acknowledged and ignored
    Unknown(String),
}

impl WebhookEventKind {
    /// Stable name for logging and the de-duplication table
    pub fn as_str(&self) -> &str {
        match self {
            Self::CheckoutCompleted => "checkout.session.completed",
            Self::SubscriptionUpdated => "customer.subscription.updated",
            Self::SubscriptionDeleted => "customer.subscription.deleted",
            Self::InvoicePaid => "invoice.paid",
            Self::InvoicePaymentFailed => "invoice.payment_failed",
            Self::Unknown(s) => s,
        }
    }
}

impl From<&str> for WebhookEventKind {
    fn from(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutCompleted,
            // A freshly created subscription carries the same payload and
            // gets the same treatment as an update.
            "customer.subscription.created" | "customer.subscription.updated" => {
                Self::SubscriptionUpdated
            }
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            "invoice.paid" => Self::InvoicePaid,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// A verified, parsed webhook event
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Provider-assigned event ID, the de-duplication key
    pub id: String,
    /// Event kind
    pub kind: WebhookEventKind,
    /// Parsed payload
    pub data: WebhookEventData,
    /// Provider-side creation time (Unix timestamp)
    pub created: i64,
}

/// Parsed webhook payloads per event kind
#[derive(Debug, Clone)]
pub enum WebhookEventData {
    /// Checkout session completion
    Checkout(CheckoutEventData),
    /// Subscription lifecycle change
    Subscription(SubscriptionEventData),
    /// Invoice outcome
    Invoice(InvoiceEventData),
    /// Unhandled event kinds carry nothing
    Ignored,
}

/// Checkout completion payload
#[derive(Debug, Clone)]
pub struct CheckoutEventData {
    pub session_id: String,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    /// Our user ID, round-tripped through the session
    pub client_reference_id: Option<String>,
    /// Purchase metadata written at session creation
    pub metadata: HashMap<String, String>,
}

/// Subscription lifecycle payload
#[derive(Debug, Clone)]
pub struct SubscriptionEventData {
    pub subscription_id: String,
    pub customer_id: String,
    pub status: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub cancel_at_period_end: bool,
}

/// Invoice payload
#[derive(Debug, Clone)]
pub struct InvoiceEventData {
    pub invoice_id: String,
    pub customer_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

/// Verifies signatures and parses webhook payloads
#[derive(Clone)]
pub struct WebhookVerifier {
    signing_secret: String,
}

impl WebhookVerifier {
    /// Create a verifier with the webhook signing secret
    pub fn new(signing_secret: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
        }
    }

    /// Verify the signature header and parse the payload.
    ///
    /// Unsigned, tampered or stale deliveries are rejected without
    /// touching any state; the failure is logged as a security event.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookEvent, BillingError> {
        self.verify_signature(payload, signature_header)?;

        let raw: RawEvent = serde_json::from_slice(payload)
            .map_err(|e| BillingError::Webhook(format!("unparseable payload: {e}")))?;

        let kind = WebhookEventKind::from(raw.event_type.as_str());
        debug!(event_id = %raw.id, event_type = %raw.event_type, "verified webhook event");

        let data = parse_event_data(&kind, raw.data.object)?;

        Ok(WebhookEvent {
            id: raw.id,
            kind,
            data,
            created: raw.created,
        })
    }

    fn verify_signature(&self, payload: &[u8], header: &str) -> Result<(), BillingError> {
        let mut timestamp: Option<&str> = None;
        let mut signature: Option<&str> = None;

        for part in header.split(',') {
            match part.split_once('=') {
                Some(("t", value)) => timestamp = Some(value),
                Some(("v1", value)) => signature = Some(value),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            warn!("webhook signature missing timestamp");
            BillingError::Webhook("missing timestamp".to_string())
        })?;
        let signature = signature.ok_or_else(|| {
            warn!("webhook signature missing v1 component");
            BillingError::Webhook("missing signature".to_string())
        })?;

        let body = std::str::from_utf8(payload)
            .map_err(|_| BillingError::Webhook("payload is not UTF-8".to_string()))?;

        let mut mac = Hmac::<Sha256>::new_from_slice(self.signing_secret.as_bytes())
            .map_err(|_| BillingError::Internal("HMAC init failed".to_string()))?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        if !constant_time_eq(signature.as_bytes(), expected.as_bytes()) {
            warn!("webhook signature verification failed");
            return Err(BillingError::Webhook(
                "signature verification failed".to_string(),
            ));
        }

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| BillingError::Webhook("invalid timestamp".to_string()))?;
        let age = (Utc::now().timestamp() - ts).abs();
        if age > TIMESTAMP_TOLERANCE_SECS {
            warn!(timestamp = ts, age_secs = age, "webhook timestamp outside tolerance");
            return Err(BillingError::Webhook("timestamp outside tolerance".to_string()));
        }

        Ok(())
    }
}

fn parse_event_data(
    kind: &WebhookEventKind,
    object: serde_json::Value,
) -> Result<WebhookEventData, BillingError> {
    let bad = |e: serde_json::Error| BillingError::Webhook(format!("bad event object: {e}"));

    match kind {
        WebhookEventKind::CheckoutCompleted => {
            let session: RawCheckoutSession = serde_json::from_value(object).map_err(bad)?;
            Ok(WebhookEventData::Checkout(CheckoutEventData {
                session_id: session.id,
                customer_id: session.customer,
                subscription_id: session.subscription,
                client_reference_id: session.client_reference_id,
                metadata: session.metadata.unwrap_or_default(),
            }))
        }
        WebhookEventKind::SubscriptionUpdated | WebhookEventKind::SubscriptionDeleted => {
            let sub: RawSubscriptionObject = serde_json::from_value(object).map_err(bad)?;
            Ok(WebhookEventData::Subscription(SubscriptionEventData {
                subscription_id: sub.id,
                customer_id: sub.customer,
                status: sub.status,
                period_start: unix_time(sub.current_period_start),
                period_end: unix_time(sub.current_period_end),
                cancel_at_period_end: sub.cancel_at_period_end,
            }))
        }
        WebhookEventKind::InvoicePaid | WebhookEventKind::InvoicePaymentFailed => {
            let invoice: RawInvoiceObject = serde_json::from_value(object).map_err(bad)?;
            Ok(WebhookEventData::Invoice(InvoiceEventData {
                invoice_id: invoice.id,
                customer_id: invoice.customer,
                amount_cents: invoice.amount_paid.unwrap_or(invoice.amount_due),
                currency: invoice.currency,
                period_start: unix_time(invoice.period_start),
                period_end: unix_time(invoice.period_end),
            }))
        }
        WebhookEventKind::Unknown(name) => {
            info!(event_type = %name, "ignoring unhandled webhook event");
            Ok(WebhookEventData::Ignored)
        }
    }
}

fn unix_time(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}

/// Constant-time comparison
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

// Raw wire shapes

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
    created: i64,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawCheckoutSession {
    id: String,
    customer: Option<String>,
    subscription: Option<String>,
    client_reference_id: Option<String>,
    metadata: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct RawSubscriptionObject {
    id: String,
    customer: String,
    status: String,
    current_period_start: i64,
    current_period_end: i64,
    #[serde(default)]
    cancel_at_period_end: bool,
}

#[derive(Debug, Deserialize)]
struct RawInvoiceObject {
    id: String,
    customer: String,
    amount_paid: Option<i64>,
    #[serde(default)]
    amount_due: i64,
    currency: String,
    period_start: i64,
    period_end: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.").as_bytes());
        mac.update(payload);
        format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
    }

    fn subscription_payload(event_type: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "id": "evt_123",
            "type": event_type,
            "created": Utc::now().timestamp(),
            "data": {
                "object": {
                    "id": "sub_123",
                    "customer": "cus_123",
                    "status": "active",
                    "current_period_start": Utc::now().timestamp(),
                    "current_period_end": Utc::now().timestamp() + 30 * 24 * 60 * 60,
                    "cancel_at_period_end": false
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn valid_signature_verifies() {
        let verifier = WebhookVerifier::new(SECRET);
        let payload = subscription_payload("customer.subscription.updated");
        let header = sign(&payload, SECRET, Utc::now().timestamp());

        let event = verifier.verify_and_parse(&payload, &header).unwrap();
        assert_eq!(event.id, "evt_123");
        assert_eq!(event.kind, WebhookEventKind::SubscriptionUpdated);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let verifier = WebhookVerifier::new(SECRET);
        let payload = subscription_payload("customer.subscription.updated");
        let header = sign(&payload, "whsec_other", Utc::now().timestamp());

        assert!(verifier.verify_and_parse(&payload, &header).is_err());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let verifier = WebhookVerifier::new(SECRET);
        let payload = subscription_payload("customer.subscription.updated");
        let header = sign(&payload, SECRET, Utc::now().timestamp());

        let mut tampered = payload.clone();
        let pos = tampered.len() / 2;
        tampered[pos] ^= 0x01;

        assert!(verifier.verify_and_parse(&tampered, &header).is_err());
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let verifier = WebhookVerifier::new(SECRET);
        let payload = subscription_payload("invoice.paid");
        let header = sign(&payload, SECRET, Utc::now().timestamp() - 600);

        let err = verifier.verify_and_parse(&payload, &header).unwrap_err();
        assert!(err.to_string().contains("tolerance"));
    }

    #[test]
    fn missing_signature_components_are_rejected() {
        let verifier = WebhookVerifier::new(SECRET);
        let payload = subscription_payload("invoice.paid");

        assert!(verifier.verify_and_parse(&payload, "t=123").is_err());
        assert!(verifier.verify_and_parse(&payload, "v1=abc").is_err());
        assert!(verifier.verify_and_parse(&payload, "").is_err());
    }

    #[test]
    fn checkout_metadata_is_parsed() {
        let payload = serde_json::to_vec(&serde_json::json!({
            "id": "evt_ck",
            "type": "checkout.session.completed",
            "created": Utc::now().timestamp(),
            "data": {
                "object": {
                    "id": "cs_1",
                    "customer": "cus_9",
                    "subscription": "sub_9",
                    "client_reference_id": "6b8f4a2e-1a9b-4a53-9df1-5be6fcb0a1cd",
                    "metadata": { "plan": "pro" }
                }
            }
        }))
        .unwrap();

        let verifier = WebhookVerifier::new(SECRET);
        let header = sign(&payload, SECRET, Utc::now().timestamp());
        let event = verifier.verify_and_parse(&payload, &header).unwrap();

        match event.data {
            WebhookEventData::Checkout(data) => {
                assert_eq!(data.metadata.get("plan").map(String::as_str), Some("pro"));
                assert!(data.client_reference_id.is_some());
            }
            other => panic!("unexpected data: {other:?}"),
        }
    }

    #[test]
    fn unknown_event_kinds_are_ignored() {
        let payload = serde_json::to_vec(&serde_json::json!({
            "id": "evt_x",
            "type": "payment_intent.succeeded",
            "created": Utc::now().timestamp(),
            "data": { "object": {} }
        }))
        .unwrap();

        let verifier = WebhookVerifier::new(SECRET);
        let header = sign(&payload, SECRET, Utc::now().timestamp());
        let event = verifier.verify_and_parse(&payload, &header).unwrap();

        assert!(matches!(event.data, WebhookEventData::Ignored));
    }

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq(b"abc123", b"abc123"));
        assert!(!constant_time_eq(b"abc123", b"abc124"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }
}
