//! CareerPro Billing Core - subscription state sync
//!
//! Stripe integration: checkout and portal session creation, webhook
//! signature verification and parsing, and the event application that is
//! the only writer of subscription state. Webhook handling is idempotent;
//! replayed provider events are dropped before any mutation.
//!
//! # Example
//!
//! ```rust,ignore
//! use careerpro_billing_core::{BillingConfig, BillingService, StripeProvider};
//!
//! let config = BillingConfig::new("sk_test_...", "whsec_...")
//!     .with_package_price(Tier::Pro, "price_...");
//!
//! let provider = StripeProvider::new(config.clone());
//! let billing = BillingService::new(provider.into(), config, subs, history, processed);
//!
//! billing.process_webhook(&payload, signature).await?;
//! ```

pub mod config;
pub mod error;
pub mod provider;
pub mod service;
pub mod stripe;
pub mod webhook;

pub use config::BillingConfig;
pub use error::BillingError;
pub use provider::PaymentProvider;
pub use service::BillingService;
pub use stripe::StripeProvider;
pub use webhook::{WebhookEvent, WebhookEventData, WebhookEventKind, WebhookVerifier};
