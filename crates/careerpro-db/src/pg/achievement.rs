//! PostgreSQL achievement repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::{AchievementRow, UserAchievementRow};
use crate::repo::AchievementRepository;

/// PostgreSQL achievement repository
#[derive(Clone)]
pub struct PgAchievementRepository {
    pool: PgPool,
}

impl PgAchievementRepository {
    /// Create a new achievement repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AchievementRepository for PgAchievementRepository {
    async fn find_incomplete_by_category(
        &self,
        user_id: Uuid,
        category: &str,
    ) -> DbResult<Vec<AchievementRow>> {
        let rows = sqlx::query_as::<_, AchievementRow>(
            r#"
            SELECT a.id, a.category, a.title, a.requirement, a.points, a.tier
            FROM achievements a
            LEFT JOIN user_achievements ua
                   ON ua.achievement_id = a.id AND ua.user_id = $1
            WHERE a.category = $2 AND COALESCE(ua.completed, false) = false
            ORDER BY a.points
            "#,
        )
        .bind(user_id)
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn mark_completed(&self, user_id: Uuid, achievement_id: Uuid) -> DbResult<bool> {
        // Upsert that flips completed exactly once; a replayed completion
        // matches zero rows and leaves completed_at untouched.
        let result = sqlx::query(
            r#"
            INSERT INTO user_achievements (user_id, achievement_id, completed, completed_at, progress)
            VALUES ($1, $2, true, NOW(), 100)
            ON CONFLICT (user_id, achievement_id)
            DO UPDATE SET completed = true, completed_at = NOW(), progress = 100
            WHERE user_achievements.completed = false
            "#,
        )
        .bind(user_id)
        .bind(achievement_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_progress(
        &self,
        user_id: Uuid,
        achievement_id: Uuid,
        progress: i32,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_achievements (user_id, achievement_id, completed, progress)
            VALUES ($1, $2, false, $3)
            ON CONFLICT (user_id, achievement_id)
            DO UPDATE SET progress = GREATEST(user_achievements.progress, $3)
            WHERE user_achievements.completed = false
            "#,
        )
        .bind(user_id)
        .bind(achievement_id)
        .bind(progress)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_completed(&self, user_id: Uuid) -> DbResult<Vec<UserAchievementRow>> {
        let rows = sqlx::query_as::<_, UserAchievementRow>(
            r#"
            SELECT user_id, achievement_id, completed, completed_at, progress
            FROM user_achievements
            WHERE user_id = $1 AND completed = true
            ORDER BY completed_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
