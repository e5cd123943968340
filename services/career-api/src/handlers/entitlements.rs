//! Entitlement and usage handlers
//!
//! The consume path is the hot one: a single atomic check-and-increment
//! against the ledger. Gating answers fail closed on store errors;
//! the summary fails open and simply omits what it cannot read.

use std::time::Instant;

use axum::Json;
use axum::extract::{Query, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use careerpro_db::UsageEventRepository;
use careerpro_types::Service;

use crate::error::ApiResult;
use crate::handlers::shared::{parse_service, parse_user_id, record_op_duration};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct EntitlementQuery {
    pub user_id: String,
    pub service: String,
}

#[derive(Debug, Serialize)]
pub struct AllowanceResponse {
    pub allowed: bool,
    /// Remaining units; absent means unlimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    pub resets_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ConsumeRequest {
    pub user_id: String,
    pub service: String,
}

#[derive(Debug, Serialize)]
pub struct ConsumeResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    pub resets_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub services: Vec<ServiceAllowance>,
}

#[derive(Debug, Serialize)]
pub struct ServiceAllowance {
    pub service: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    pub resets_at: DateTime<Utc>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/entitlements/check
///
/// Gating decision. A store failure denies rather than erring: the
/// response is always a verdict, never a 5xx the tool would misread.
#[instrument(skip(state, query), fields(user_id = %query.user_id, service = %query.service))]
pub async fn check_entitlement(
    State(state): State<AppState>,
    Query(query): Query<EntitlementQuery>,
) -> ApiResult<Json<AllowanceResponse>> {
    let start = Instant::now();

    let user_id = parse_user_id(&query.user_id)?;
    let service = parse_service(&query.service)?;

    let allowance = state.evaluator.gate(user_id, service).await;

    record_op_duration("check_entitlement", start, true);

    Ok(Json(AllowanceResponse {
        allowed: allowance.allowed,
        remaining: allowance.remaining,
        resets_at: allowance.resets_at,
    }))
}

/// POST /api/v1/usage/consume
/// Hot path - one atomic check-and-increment
#[instrument(skip(state, req), fields(user_id = %req.user_id, service = %req.service))]
pub async fn consume_usage(
    State(state): State<AppState>,
    Json(req): Json<ConsumeRequest>,
) -> ApiResult<Json<ConsumeResponse>> {
    let start = Instant::now();

    let user_id = parse_user_id(&req.user_id)?;
    let service = parse_service(&req.service)?;

    // Fail closed: an unreachable ledger denies the action
    let decision = match state.evaluator.authorize_and_record(user_id, service).await {
        Ok(decision) => decision,
        Err(e) => {
            tracing::warn!(error = %e, "consume failed, denying");
            metrics::counter!(
                "careerpro_usage_consumed_total",
                "service" => service.as_str(), "result" => "error"
            )
            .increment(1);
            record_op_duration("consume_usage", start, false);
            return Ok(Json(ConsumeResponse {
                allowed: false,
                remaining: Some(0),
                resets_at: Utc::now() + careerpro_types::QuotaWindow::Hourly.duration(),
            }));
        }
    };

    let result = if decision.recorded { "recorded" } else { "denied" };
    metrics::counter!(
        "careerpro_usage_consumed_total",
        "service" => service.as_str(), "result" => result
    )
    .increment(1);
    record_op_duration("consume_usage", start, true);

    Ok(Json(ConsumeResponse {
        allowed: decision.recorded,
        remaining: decision.remaining,
        resets_at: decision.resets_at,
    }))
}

/// POST /api/v1/usage/record
///
/// Post-hoc append for work authorized earlier in the same interaction.
#[instrument(skip(state, req), fields(user_id = %req.user_id, service = %req.service))]
pub async fn record_usage(
    State(state): State<AppState>,
    Json(req): Json<ConsumeRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let start = Instant::now();

    let user_id = parse_user_id(&req.user_id)?;
    let service = parse_service(&req.service)?;

    state.evaluator.record(user_id, service).await?;

    record_op_duration("record_usage", start, true);

    Ok(Json(serde_json::json!({ "recorded": true })))
}

/// DELETE /api/v1/usage
///
/// Account-deletion support: removes every ledger row for the user.
/// The ledger is append-only for all other callers.
#[instrument(skip(state, query), fields(user_id = %query.user_id))]
pub async fn purge_usage(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let start = Instant::now();

    let user_id = parse_user_id(&query.user_id)?;
    let deleted = state.repos.usage.delete_for_user(user_id.0).await?;

    record_op_duration("purge_usage", start, true);
    tracing::info!(user_id = %user_id, deleted, "usage ledger purged");

    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

/// GET /api/v1/usage/summary
///
/// Monthly remaining per service, for display. Services whose counts
/// cannot be read right now are omitted instead of failing the request.
#[instrument(skip(state, query), fields(user_id = %query.user_id))]
pub async fn usage_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<Json<SummaryResponse>> {
    let start = Instant::now();

    let user_id = parse_user_id(&query.user_id)?;

    let mut services = Vec::with_capacity(Service::ALL.len());
    for service in Service::ALL {
        if let Some(allowance) = state.evaluator.display(user_id, service).await {
            services.push(ServiceAllowance {
                service: service.as_str(),
                remaining: allowance.remaining,
                resets_at: allowance.resets_at,
            });
        }
    }

    record_op_duration("usage_summary", start, true);

    Ok(Json(SummaryResponse { services }))
}
