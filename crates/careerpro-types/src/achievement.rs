//! Achievement types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Service;

/// Unique achievement identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AchievementId(pub Uuid);

impl std::fmt::Display for AchievementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Badge tier of an achievement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTier {
    Bronze,
    Silver,
    Gold,
}

/// Declarative requirement predicate for unlocking an achievement.
///
/// Stored as tagged JSON in the achievements table; evaluated against
/// the usage ledger and the triggering action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Requirement {
    /// Lifetime usage count for one service reaches the target
    Count {
        service: Service,
        target: i64,
    },
    /// N consecutive calendar days each with at least one usage event
    Streak {
        days: u32,
    },
    /// The triggering action's reported score meets a threshold
    Quality {
        min_score: f64,
    },
}

/// Static achievement definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    /// Achievement ID
    pub id: AchievementId,
    /// Grouping category (e.g. "cv", "consistency")
    pub category: String,
    /// Display title
    pub title: String,
    /// Unlock requirement
    pub requirement: Requirement,
    /// Points awarded on completion
    pub points: u32,
    /// Badge tier
    pub tier: BadgeTier,
}

/// A user's progress against one achievement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAchievement {
    /// Achievement being tracked
    pub achievement_id: AchievementId,
    /// Whether the achievement is completed
    pub completed: bool,
    /// When it was completed, if ever
    pub completed_at: Option<DateTime<Utc>>,
    /// Progress toward the target, 0-100
    pub progress: i32,
}

/// The just-completed unit of work that triggers an achievement check
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ToolAction {
    /// Which tool was used
    pub service: Service,
    /// Quality score reported by the tool, if any
    pub score: Option<f64>,
}
