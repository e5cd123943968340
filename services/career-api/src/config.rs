//! Configuration for the CareerPro API service.

use std::sync::Arc;
use std::time::Duration;

use careerpro_billing_core::BillingConfig;
use careerpro_email::EmailConfig;
use careerpro_entitlements::PlanCatalog;
use careerpro_types::{Service, Tier};

/// CareerPro API configuration
#[derive(Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Billing core configuration
    pub billing: BillingConfig,
    /// Email sender configuration
    pub email: EmailConfig,
    /// Entitlement limit tables
    pub catalog: Arc<PlanCatalog>,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        // Stripe configuration
        let stripe_secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| ConfigError::Missing("STRIPE_SECRET_KEY"))?;
        let stripe_webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| ConfigError::Missing("STRIPE_WEBHOOK_SECRET"))?;

        let default_success_url = std::env::var("BILLING_SUCCESS_URL")
            .unwrap_or_else(|_| "https://app.aicareerpro.example/billing/success".to_string());
        let default_cancel_url = std::env::var("BILLING_CANCEL_URL")
            .unwrap_or_else(|_| "https://app.aicareerpro.example/billing/cancel".to_string());

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;
        let request_timeout = Duration::from_secs(request_timeout_secs);

        let mut billing = BillingConfig::new(&stripe_secret_key, &stripe_webhook_secret)
            .with_urls(&default_success_url, &default_cancel_url)
            .with_request_timeout(request_timeout);

        for (tier, var) in [
            (Tier::Pro, "STRIPE_PRICE_PRO"),
            (Tier::Enterprise, "STRIPE_PRICE_ENTERPRISE"),
        ] {
            if let Ok(price_id) = std::env::var(var) {
                billing = billing.with_package_price(tier, price_id);
            }
        }

        for (service, var) in [
            (Service::Cv, "STRIPE_PRICE_CV"),
            (Service::CoverLetter, "STRIPE_PRICE_COVER_LETTER"),
            (Service::Email, "STRIPE_PRICE_EMAIL"),
            (Service::Interview, "STRIPE_PRICE_INTERVIEW"),
        ] {
            if let Ok(price_id) = std::env::var(var) {
                billing = billing.with_service_price(service, price_id);
            }
        }

        // Email sender
        let email_api_base = std::env::var("EMAIL_API_BASE")
            .map_err(|_| ConfigError::Missing("EMAIL_API_BASE"))?;
        let email_api_key =
            std::env::var("EMAIL_API_KEY").map_err(|_| ConfigError::Missing("EMAIL_API_KEY"))?;
        let mut email = EmailConfig::new(email_api_base, email_api_key);
        if let Ok(from) = std::env::var("EMAIL_FROM") {
            email = email.with_from_address(from);
        }

        let metrics_enabled = std::env::var("METRICS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        Ok(Self {
            http_port,
            database_url,
            billing,
            email,
            catalog: Arc::new(PlanCatalog::builtin()),
            request_timeout,
            metrics_enabled,
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Secrets stay out of logs
        f.debug_struct("Config")
            .field("http_port", &self.http_port)
            .field("request_timeout", &self.request_timeout)
            .field("metrics_enabled", &self.metrics_enabled)
            .finish_non_exhaustive()
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
