//! PostgreSQL usage ledger repository implementation

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::UsageEventRow;
use crate::repo::{ConsumeCaps, ConsumeOutcome, CreateUsageEvent, UsageEventRepository};

/// PostgreSQL usage ledger repository
#[derive(Clone)]
pub struct PgUsageEventRepository {
    pool: PgPool,
}

impl PgUsageEventRepository {
    /// Create a new usage ledger repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageEventRepository for PgUsageEventRepository {
    async fn append(&self, event: CreateUsageEvent) -> DbResult<UsageEventRow> {
        let row = sqlx::query_as::<_, UsageEventRow>(
            r#"
            INSERT INTO usage_events (id, user_id, service, count)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, service, count, occurred_at
            "#,
        )
        .bind(event.id)
        .bind(event.user_id)
        .bind(&event.service)
        .bind(event.count)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn append_if_within(
        &self,
        event: CreateUsageEvent,
        caps: ConsumeCaps,
    ) -> DbResult<ConsumeOutcome> {
        let mut tx = self.pool.begin().await?;

        // Serialize concurrent consumers of the same (user, service) so the
        // count below cannot go stale before the insert. The lock is released
        // at commit/rollback.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text || ':' || $2, 0))")
            .bind(event.user_id)
            .bind(&event.service)
            .execute(&mut *tx)
            .await?;

        let mut used_hour = 0i64;
        if let Some(cap) = caps.hourly {
            let (used,): (i64,) = sqlx::query_as(
                "SELECT COALESCE(SUM(count), 0) FROM usage_events \
                 WHERE user_id = $1 AND service = $2 AND occurred_at >= $3",
            )
            .bind(event.user_id)
            .bind(&event.service)
            .bind(cap.since)
            .fetch_one(&mut *tx)
            .await?;
            used_hour = used;
        }

        let mut used_month = 0i64;
        if let Some(cap) = caps.monthly {
            let (used,): (i64,) = sqlx::query_as(
                "SELECT COALESCE(SUM(count), 0) FROM usage_events \
                 WHERE user_id = $1 AND service = $2 AND occurred_at >= $3",
            )
            .bind(event.user_id)
            .bind(&event.service)
            .bind(cap.since)
            .fetch_one(&mut *tx)
            .await?;
            used_month = used;
        }

        let hourly_ok = caps.hourly.is_none_or(|cap| used_hour + event.count <= cap.limit);
        let monthly_ok = caps.monthly.is_none_or(|cap| used_month + event.count <= cap.limit);

        if !(hourly_ok && monthly_ok) {
            tx.rollback().await?;
            return Ok(ConsumeOutcome {
                recorded: false,
                used_hour,
                used_month,
            });
        }

        sqlx::query("INSERT INTO usage_events (id, user_id, service, count) VALUES ($1, $2, $3, $4)")
            .bind(event.id)
            .bind(event.user_id)
            .bind(&event.service)
            .bind(event.count)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(ConsumeOutcome {
            recorded: true,
            used_hour: used_hour + event.count,
            used_month: used_month + event.count,
        })
    }

    async fn count_since(
        &self,
        user_id: Uuid,
        service: &str,
        since: DateTime<Utc>,
    ) -> DbResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(count), 0) FROM usage_events \
             WHERE user_id = $1 AND service = $2 AND occurred_at >= $3",
        )
        .bind(user_id)
        .bind(service)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn total_count(&self, user_id: Uuid, service: &str) -> DbResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(count), 0) FROM usage_events \
             WHERE user_id = $1 AND service = $2",
        )
        .bind(user_id)
        .bind(service)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn active_days(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<NaiveDate>> {
        let days: Vec<(NaiveDate,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT (occurred_at AT TIME ZONE 'UTC')::date AS day
            FROM usage_events
            WHERE user_id = $1
            ORDER BY day DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(days.into_iter().map(|(d,)| d).collect())
    }

    async fn delete_for_user(&self, user_id: Uuid) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM usage_events WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
