//! Subscription and billing handlers

use std::time::Instant;

use axum::Json;
use axum::extract::{Query, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use careerpro_types::{CheckoutItem, Tier};

use crate::error::{ApiError, ApiResult};
use crate::handlers::shared::{parse_service, parse_user_id, record_op_duration};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub id: String,
    pub user_id: String,
    pub package_plan: Option<String>,
    pub service_overrides: std::collections::HashMap<String, String>,
    pub status: String,
    pub billing_cycle: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub cancel_at_period_end: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    pub user_id: String,
    /// Package plan tier; mutually exclusive with `service`
    pub plan: Option<String>,
    /// Single service to upgrade; mutually exclusive with `plan`
    pub service: Option<String>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePortalRequest {
    pub user_id: String,
    pub return_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PortalResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub user_id: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct BillingRecordResponse {
    pub stripe_invoice_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/billing/subscription
pub async fn get_subscription(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let start = Instant::now();

    let user_id = parse_user_id(&query.user_id)?;
    let sub = state.billing.get_subscription(user_id).await?;

    record_op_duration("get_subscription", start, true);

    Ok(Json(SubscriptionResponse {
        id: sub.id.to_string(),
        user_id: sub.user_id.to_string(),
        package_plan: sub.package_plan.map(|t| t.to_string()),
        service_overrides: sub
            .service_overrides
            .into_iter()
            .map(|(service, tier)| (service.to_string(), tier.to_string()))
            .collect(),
        status: sub.status.to_string(),
        billing_cycle: sub.billing_cycle.as_str().to_string(),
        current_period_start: sub.current_period_start,
        current_period_end: sub.current_period_end,
        cancel_at_period_end: sub.cancel_at_period_end,
    }))
}

/// POST /api/v1/billing/checkout
#[instrument(skip(state, req), fields(user_id = %req.user_id))]
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(req): Json<CreateCheckoutRequest>,
) -> ApiResult<Json<CheckoutResponse>> {
    let start = Instant::now();

    let user_id = parse_user_id(&req.user_id)?;

    let item = match (req.plan.as_deref(), req.service.as_deref()) {
        (Some(plan), None) => {
            let tier: Tier = plan
                .parse()
                .map_err(|_| ApiError::BadRequest(format!("Invalid plan: {plan}")))?;
            if tier == Tier::Free {
                return Err(ApiError::BadRequest("Cannot check out the free plan".into()));
            }
            CheckoutItem::Package { tier }
        }
        (None, Some(service)) => CheckoutItem::SingleService {
            service: parse_service(service)?,
        },
        _ => {
            return Err(ApiError::BadRequest(
                "Provide exactly one of plan or service".into(),
            ));
        }
    };

    let session = state
        .billing
        .create_checkout(
            user_id,
            item,
            req.success_url.as_deref(),
            req.cancel_url.as_deref(),
        )
        .await?;

    metrics::counter!("careerpro_checkouts_created_total").increment(1);
    record_op_duration("create_checkout", start, true);

    tracing::info!(user_id = %user_id, "Checkout session created");

    Ok(Json(CheckoutResponse {
        session_id: session.session_id,
        url: session.url,
    }))
}

/// POST /api/v1/billing/portal
#[instrument(skip(state, req), fields(user_id = %req.user_id))]
pub async fn create_portal(
    State(state): State<AppState>,
    Json(req): Json<CreatePortalRequest>,
) -> ApiResult<Json<PortalResponse>> {
    let start = Instant::now();

    let user_id = parse_user_id(&req.user_id)?;
    let portal = state
        .billing
        .create_portal(user_id, req.return_url.as_deref())
        .await?;

    record_op_duration("create_portal", start, true);

    Ok(Json(PortalResponse { url: portal.url }))
}

/// GET /api/v1/billing/history
pub async fn billing_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<BillingRecordResponse>>> {
    let start = Instant::now();

    let user_id = parse_user_id(&query.user_id)?;
    let limit = query.limit.unwrap_or(24).clamp(1, 100);

    let records = state.billing.billing_history(user_id, limit).await?;

    record_op_duration("billing_history", start, true);

    Ok(Json(
        records
            .into_iter()
            .map(|r| BillingRecordResponse {
                stripe_invoice_id: r.stripe_invoice_id,
                amount_cents: r.amount_cents,
                currency: r.currency,
                period_start: r.period_start,
                period_end: r.period_end,
                created_at: r.created_at,
            })
            .collect(),
    ))
}
