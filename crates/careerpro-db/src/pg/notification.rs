//! PostgreSQL notification preference repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::NotificationPrefsRow;
use crate::repo::NotificationPreferenceRepository;

/// PostgreSQL notification preference repository
#[derive(Clone)]
pub struct PgNotificationPreferenceRepository {
    pool: PgPool,
}

impl PgNotificationPreferenceRepository {
    /// Create a new notification preference repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationPreferenceRepository for PgNotificationPreferenceRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Option<NotificationPrefsRow>> {
        let prefs = sqlx::query_as::<_, NotificationPrefsRow>(
            r#"
            SELECT user_id, product_updates, usage_alerts, billing_alerts, updated_at
            FROM notification_preferences
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(prefs)
    }
}
