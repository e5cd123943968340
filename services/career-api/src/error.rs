//! Error types for the CareerPro API service.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use careerpro_billing_core::BillingError;
use careerpro_email::EmailError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error")]
    Database(#[from] careerpro_db::DbError),

    #[error("Billing error: {0}")]
    Billing(#[from] BillingError),

    #[error("Entitlement error: {0}")]
    Entitlement(#[from] careerpro_entitlements::EntitlementError),

    #[error("Achievement error: {0}")]
    Achievement(#[from] careerpro_achievements::AchievementError),

    #[error("Email error: {0}")]
    Email(#[from] EmailError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Billing(
                BillingError::SubscriptionNotFound | BillingError::CustomerNotFound,
            ) => StatusCode::NOT_FOUND,
            Self::Billing(BillingError::Webhook(_) | BillingError::PriceNotConfigured(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Email(EmailError::UnknownTemplate(_) | EmailError::MissingVariable { .. }) => {
                StatusCode::BAD_REQUEST
            }
            Self::Database(_)
            | Self::Billing(_)
            | Self::Entitlement(_)
            | Self::Achievement(_)
            | Self::Email(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Billing(BillingError::SubscriptionNotFound) => "SUBSCRIPTION_NOT_FOUND",
            Self::Billing(BillingError::CustomerNotFound) => "CUSTOMER_NOT_FOUND",
            Self::Billing(BillingError::Webhook(_)) => "WEBHOOK_ERROR",
            Self::Billing(BillingError::PriceNotConfigured(_)) => "PRICE_NOT_CONFIGURED",
            Self::Email(EmailError::UnknownTemplate(_)) => "UNKNOWN_TEMPLATE",
            Self::Email(EmailError::MissingVariable { .. }) => "MISSING_VARIABLE",
            Self::Database(_)
            | Self::Billing(_)
            | Self::Entitlement(_)
            | Self::Achievement(_)
            | Self::Email(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = ?self, "Internal API error");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
