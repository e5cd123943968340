//! Achievement handlers

use std::time::Instant;

use axum::Json;
use axum::extract::{Query, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use careerpro_db::AchievementRepository;
use careerpro_types::ToolAction;

use crate::error::ApiResult;
use crate::handlers::shared::{parse_service, parse_user_id, record_op_duration};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CheckAchievementsRequest {
    pub user_id: String,
    pub category: String,
    pub service: String,
    /// Quality score of the triggering action, if the tool reported one
    pub score: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct UnlockedResponse {
    /// The newly completed achievement, if any
    pub unlocked: Option<UnlockedAchievement>,
}

#[derive(Debug, Serialize)]
pub struct UnlockedAchievement {
    pub id: String,
    pub title: String,
    pub category: String,
    pub points: u32,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct CompletedAchievement {
    pub achievement_id: String,
    pub completed_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/achievements/check
///
/// Called after a successful tool action. Returns at most one unlock;
/// clients re-invoke until `unlocked` comes back null.
#[instrument(skip(state, req), fields(user_id = %req.user_id, category = %req.category))]
pub async fn check_achievements(
    State(state): State<AppState>,
    Json(req): Json<CheckAchievementsRequest>,
) -> ApiResult<Json<UnlockedResponse>> {
    let start = Instant::now();

    let user_id = parse_user_id(&req.user_id)?;
    let service = parse_service(&req.service)?;

    let action = ToolAction {
        service,
        score: req.score,
    };

    let unlocked = state
        .achievements
        .check(user_id, &req.category, action)
        .await?;

    if let Some(ref achievement) = unlocked {
        metrics::counter!(
            "careerpro_achievements_unlocked_total",
            "category" => achievement.category.clone()
        )
        .increment(1);
    }

    record_op_duration("check_achievements", start, true);

    Ok(Json(UnlockedResponse {
        unlocked: unlocked.map(|a| UnlockedAchievement {
            id: a.id.to_string(),
            title: a.title,
            category: a.category,
            points: a.points,
        }),
    }))
}

/// GET /api/v1/achievements
pub async fn list_achievements(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<CompletedAchievement>>> {
    let start = Instant::now();

    let user_id = parse_user_id(&query.user_id)?;
    let rows = state.repos.achievements.find_completed(user_id.0).await?;

    record_op_duration("list_achievements", start, true);

    Ok(Json(
        rows.into_iter()
            .map(|r| CompletedAchievement {
                achievement_id: r.achievement_id.to_string(),
                completed_at: r.completed_at,
            })
            .collect(),
    ))
}
