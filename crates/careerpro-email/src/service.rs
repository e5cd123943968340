//! Email service

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, instrument};

use careerpro_db::NotificationPreferenceRepository;
use careerpro_types::UserId;

use crate::error::EmailError;
use crate::template::TemplateSet;

/// Notification preference categories a send can be gated on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Product news and feature announcements
    ProductUpdates,
    /// Allowance warnings and usage summaries
    UsageAlerts,
    /// Payment and subscription notices
    BillingAlerts,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProductUpdates => write!(f, "product_updates"),
            Self::UsageAlerts => write!(f, "usage_alerts"),
            Self::BillingAlerts => write!(f, "billing_alerts"),
        }
    }
}

/// Email service configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Base URL of the email API
    pub api_base: String,
    /// API key for the email provider
    pub api_key: String,
    /// From address for all sends
    pub from_address: String,
    /// Timeout applied to every send
    pub request_timeout: Duration,
}

impl EmailConfig {
    /// Create a new email config
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            api_key: api_key.into(),
            from_address: "no-reply@aicareerpro.example".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Set the from address
    pub fn with_from_address(mut self, from: impl Into<String>) -> Self {
        self.from_address = from.into();
        self
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// Outbound email sender with an internal template cache.
///
/// Constructed once at the composition root and injected where needed;
/// there is no global instance.
pub struct EmailService {
    client: Client,
    config: EmailConfig,
    templates: TemplateSet,
    prefs: Arc<dyn NotificationPreferenceRepository>,
}

impl EmailService {
    /// Create a new email service
    pub fn new(
        config: EmailConfig,
        templates: TemplateSet,
        prefs: Arc<dyn NotificationPreferenceRepository>,
    ) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            config,
            templates,
            prefs,
        }
    }

    /// Render and send a templated email.
    ///
    /// When `gate` is set and the user has opted out of that notification
    /// kind, the send is skipped and `Ok(false)` is returned. Sends are
    /// never retried: the POST has no idempotency key, and a duplicate
    /// email is worse than a missing one.
    #[instrument(skip(self, vars), fields(user = %user, template = %template_name))]
    pub async fn send_templated(
        &self,
        user: UserId,
        to: &str,
        template_name: &str,
        vars: &HashMap<String, String>,
        gate: Option<NotificationKind>,
    ) -> Result<bool, EmailError> {
        if let Some(kind) = gate {
            if !self.is_opted_in(user, kind).await? {
                debug!(kind = %kind, "send skipped by notification preference");
                return Ok(false);
            }
        }

        let rendered = self.templates.render(template_name, vars)?;

        let request = SendRequest {
            from: &self.config.from_address,
            to,
            subject: &rendered.subject,
            html: &rendered.body,
        };

        let response = self
            .client
            .post(format!("{}/send", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "email send failed");
                EmailError::Send(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            error!(status = %status, "email API rejected send");
            return Err(EmailError::Send(format!("email API error: {status}")));
        }

        debug!("email sent");
        Ok(true)
    }

    /// Whether the user accepts this notification kind; a missing
    /// preferences row means opted in.
    async fn is_opted_in(&self, user: UserId, kind: NotificationKind) -> Result<bool, EmailError> {
        let Some(prefs) = self.prefs.find_by_user_id(user.0).await? else {
            return Ok(true);
        };
        Ok(match kind {
            NotificationKind::ProductUpdates => prefs.product_updates,
            NotificationKind::UsageAlerts => prefs.usage_alerts,
            NotificationKind::BillingAlerts => prefs.billing_alerts,
        })
    }
}
