//! Notification handlers

use std::collections::HashMap;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use careerpro_email::NotificationKind;

use crate::error::{ApiError, ApiResult};
use crate::handlers::shared::{parse_user_id, record_op_duration};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendNotificationRequest {
    pub user_id: String,
    pub to: String,
    pub template: String,
    #[serde(default)]
    pub variables: HashMap<String, String>,
    /// Preference category gating this send, if any
    pub gate: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendNotificationResponse {
    /// False when the user's preferences suppressed the send
    pub sent: bool,
}

/// POST /api/v1/notifications/send
#[instrument(skip(state, req), fields(user_id = %req.user_id, template = %req.template))]
pub async fn send_notification(
    State(state): State<AppState>,
    Json(req): Json<SendNotificationRequest>,
) -> ApiResult<Json<SendNotificationResponse>> {
    let start = Instant::now();

    let user_id = parse_user_id(&req.user_id)?;

    let gate = match req.gate.as_deref() {
        None => None,
        Some("product_updates") => Some(NotificationKind::ProductUpdates),
        Some("usage_alerts") => Some(NotificationKind::UsageAlerts),
        Some("billing_alerts") => Some(NotificationKind::BillingAlerts),
        Some(other) => {
            return Err(ApiError::BadRequest(format!("Invalid gate: {other}")));
        }
    };

    let sent = state
        .email
        .send_templated(user_id, &req.to, &req.template, &req.variables, gate)
        .await?;

    record_op_duration("send_notification", start, true);

    Ok(Json(SendNotificationResponse { sent }))
}
