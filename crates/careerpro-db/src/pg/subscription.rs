//! PostgreSQL subscription repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::SubscriptionRow;
use crate::repo::SubscriptionRepository;

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, package_plan, service_overrides, status, \
     billing_cycle, stripe_customer_id, stripe_subscription_id, \
     current_period_start, current_period_end, cancel_at_period_end, \
     created_at, updated_at";

/// PostgreSQL subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn find_by_stripe_subscription_id(
        &self,
        stripe_id: &str,
    ) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE stripe_subscription_id = $1"
        ))
        .bind(stripe_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn find_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE stripe_customer_id = $1"
        ))
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn ensure_exists(&self, user_id: Uuid) -> DbResult<SubscriptionRow> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn activate_package(
        &self,
        user_id: Uuid,
        customer_id: &str,
        subscription_id: Option<&str>,
        plan: &str,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET package_plan = $1,
                status = 'active',
                stripe_customer_id = $2,
                stripe_subscription_id = COALESCE($3, stripe_subscription_id),
                updated_at = NOW()
            WHERE user_id = $4
            "#,
        )
        .bind(plan)
        .bind(customer_id)
        .bind(subscription_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn activate_service_override(
        &self,
        user_id: Uuid,
        customer_id: &str,
        subscription_id: Option<&str>,
        service: &str,
        tier: &str,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET service_overrides = service_overrides || jsonb_build_object($1::text, $2::text),
                status = 'active',
                stripe_customer_id = $3,
                stripe_subscription_id = COALESCE($4, stripe_subscription_id),
                updated_at = NOW()
            WHERE user_id = $5
            "#,
        )
        .bind(service)
        .bind(tier)
        .bind(customer_id)
        .bind(subscription_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn sync_provider_state(
        &self,
        stripe_subscription_id: &str,
        status: &str,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        cancel_at_period_end: bool,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = $1,
                current_period_start = $2,
                current_period_end = $3,
                cancel_at_period_end = $4,
                updated_at = NOW()
            WHERE stripe_subscription_id = $5
            "#,
        )
        .bind(status)
        .bind(period_start)
        .bind(period_end)
        .bind(cancel_at_period_end)
        .bind(stripe_subscription_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn cancel_by_stripe_subscription_id(&self, stripe_id: &str) -> DbResult<()> {
        sqlx::query(
            "UPDATE subscriptions SET status = 'canceled', updated_at = NOW() \
             WHERE stripe_subscription_id = $1",
        )
        .bind(stripe_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_status_by_stripe_customer_id(
        &self,
        customer_id: &str,
        status: &str,
    ) -> DbResult<()> {
        sqlx::query(
            "UPDATE subscriptions SET status = $1, updated_at = NOW() \
             WHERE stripe_customer_id = $2",
        )
        .bind(status)
        .bind(customer_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
