//! Achievement evaluator

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tracing::{info, instrument};

use careerpro_db::{AchievementRepository, UsageEventRepository};
use careerpro_types::{Achievement, Requirement, ToolAction, UserId};

use crate::error::AchievementError;

/// How a requirement evaluated for one user
#[derive(Debug, Clone, Copy)]
struct RequirementStatus {
    met: bool,
    /// Percent progress toward the target, 0-100
    progress: i32,
}

/// Evaluates achievement requirements against the usage ledger
pub struct AchievementEvaluator {
    achievements: Arc<dyn AchievementRepository>,
    usage: Arc<dyn UsageEventRepository>,
}

impl AchievementEvaluator {
    /// Create a new achievement evaluator
    pub fn new(
        achievements: Arc<dyn AchievementRepository>,
        usage: Arc<dyn UsageEventRepository>,
    ) -> Self {
        Self {
            achievements,
            usage,
        }
    }

    /// Check whether the action just performed completes an achievement in
    /// `category`.
    ///
    /// Stops at the first requirement that is satisfied and marks it
    /// completed; callers re-invoke to discover further unlocks. Partial
    /// progress on count and streak requirements is persisted along the way.
    /// Re-checking a completed achievement is a no-op: completed rows are
    /// excluded from the candidate set and the completion upsert flips the
    /// flag at most once.
    #[instrument(skip(self), fields(user = %user, category = %category))]
    pub async fn check(
        &self,
        user: UserId,
        category: &str,
        action: ToolAction,
    ) -> Result<Option<Achievement>, AchievementError> {
        let candidates = self
            .achievements
            .find_incomplete_by_category(user.0, category)
            .await?;

        for row in candidates {
            let achievement = row.to_domain()?;
            let status = self.evaluate(user, &achievement.requirement, action).await?;

            if status.met {
                let newly = self.achievements.mark_completed(user.0, row.id).await?;
                if newly {
                    info!(
                        achievement = %achievement.title,
                        points = achievement.points,
                        "achievement completed"
                    );
                }
                return Ok(Some(achievement));
            }

            if status.progress > 0 {
                self.achievements
                    .set_progress(user.0, row.id, status.progress)
                    .await?;
            }
        }

        Ok(None)
    }

    async fn evaluate(
        &self,
        user: UserId,
        requirement: &Requirement,
        action: ToolAction,
    ) -> Result<RequirementStatus, AchievementError> {
        match requirement {
            Requirement::Count { service, target } => {
                let total = self.usage.total_count(user.0, service.as_str()).await?;
                Ok(RequirementStatus {
                    met: total >= *target,
                    progress: percent(total, *target),
                })
            }
            Requirement::Streak { days } => {
                // One extra day so a broken run is distinguishable from a
                // truncated query.
                let active = self
                    .usage
                    .active_days(user.0, i64::from(*days) + 1)
                    .await?;
                let run = consecutive_run(&active);
                Ok(RequirementStatus {
                    met: run >= u64::from(*days),
                    progress: percent(run as i64, i64::from(*days)),
                })
            }
            Requirement::Quality { min_score } => {
                let met = action.score.is_some_and(|score| score >= *min_score);
                Ok(RequirementStatus {
                    met,
                    progress: if met { 100 } else { 0 },
                })
            }
        }
    }
}

/// Length of the consecutive-day run starting at the most recent active day.
///
/// `days` must be distinct dates in descending order. Any gap ends the run:
/// activity on days {1,2,4} counts as a run of 1, not 3.
fn consecutive_run(days: &[NaiveDate]) -> u64 {
    let Some(&latest) = days.first() else {
        return 0;
    };

    let mut run = 1u64;
    let mut expected = latest;
    for &day in &days[1..] {
        match expected.checked_sub_days(Days::new(1)) {
            Some(prev) if day == prev => {
                run += 1;
                expected = prev;
            }
            _ => break,
        }
    }
    run
}

fn percent(current: i64, target: i64) -> i32 {
    if target <= 0 {
        return 100;
    }
    ((current.saturating_mul(100) / target).clamp(0, 100)) as i32
}
