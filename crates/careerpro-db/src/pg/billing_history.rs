//! PostgreSQL billing history repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::BillingHistoryRow;
use crate::repo::{BillingHistoryRepository, CreateBillingRecord};

/// PostgreSQL billing history repository
#[derive(Clone)]
pub struct PgBillingHistoryRepository {
    pool: PgPool,
}

impl PgBillingHistoryRepository {
    /// Create a new billing history repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BillingHistoryRepository for PgBillingHistoryRepository {
    async fn append(&self, record: CreateBillingRecord) -> DbResult<bool> {
        // Keyed on the Stripe invoice ID so a replayed invoice.paid event
        // cannot produce a second row.
        let result = sqlx::query(
            r#"
            INSERT INTO billing_history
                (id, user_id, stripe_invoice_id, amount_cents, currency,
                 description, period_start, period_end)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (stripe_invoice_id) DO NOTHING
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.stripe_invoice_id)
        .bind(record.amount_cents)
        .bind(&record.currency)
        .bind(&record.description)
        .bind(record.period_start)
        .bind(record.period_end)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<BillingHistoryRow>> {
        let rows = sqlx::query_as::<_, BillingHistoryRow>(
            r#"
            SELECT id, user_id, stripe_invoice_id, amount_cents, currency,
                   description, period_start, period_end, created_at
            FROM billing_history
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
