//! Mock repositories for testing

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use careerpro_db::{
    AchievementRepository, AchievementRow, ConsumeCaps, ConsumeOutcome, CreateUsageEvent,
    DbResult, UsageEventRepository, UsageEventRow, UserAchievementRow,
};
use careerpro_types::Requirement;

/// In-memory achievement repository for testing
#[derive(Default, Clone)]
pub struct MockAchievementRepository {
    definitions: Arc<Mutex<Vec<AchievementRow>>>,
    user_rows: Arc<DashMap<(Uuid, Uuid), UserAchievementRow>>,
}

impl MockAchievementRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an achievement definition
    pub async fn insert_definition(
        &self,
        category: &str,
        title: &str,
        requirement: Requirement,
        points: i32,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.definitions.lock().await.push(AchievementRow {
            id,
            category: category.to_string(),
            title: title.to_string(),
            requirement: serde_json::to_value(&requirement).unwrap(),
            points,
            tier: "bronze".to_string(),
        });
        id
    }

    pub fn progress_of(&self, user_id: Uuid, achievement_id: Uuid) -> Option<i32> {
        self.user_rows
            .get(&(user_id, achievement_id))
            .map(|r| r.progress)
    }

    pub fn completed_at_of(
        &self,
        user_id: Uuid,
        achievement_id: Uuid,
    ) -> Option<DateTime<Utc>> {
        self.user_rows
            .get(&(user_id, achievement_id))
            .and_then(|r| r.completed_at)
    }
}

#[async_trait]
impl AchievementRepository for MockAchievementRepository {
    async fn find_incomplete_by_category(
        &self,
        user_id: Uuid,
        category: &str,
    ) -> DbResult<Vec<AchievementRow>> {
        let defs = self.definitions.lock().await;
        Ok(defs
            .iter()
            .filter(|d| d.category == category)
            .filter(|d| {
                self.user_rows
                    .get(&(user_id, d.id))
                    .map(|r| !r.completed)
                    .unwrap_or(true)
            })
            .cloned()
            .collect())
    }

    async fn mark_completed(&self, user_id: Uuid, achievement_id: Uuid) -> DbResult<bool> {
        let key = (user_id, achievement_id);
        let mut entry = self.user_rows.entry(key).or_insert_with(|| UserAchievementRow {
            user_id,
            achievement_id,
            completed: false,
            completed_at: None,
            progress: 0,
        });
        if entry.completed {
            return Ok(false);
        }
        entry.completed = true;
        entry.completed_at = Some(Utc::now());
        entry.progress = 100;
        Ok(true)
    }

    async fn set_progress(
        &self,
        user_id: Uuid,
        achievement_id: Uuid,
        progress: i32,
    ) -> DbResult<()> {
        let key = (user_id, achievement_id);
        let mut entry = self.user_rows.entry(key).or_insert_with(|| UserAchievementRow {
            user_id,
            achievement_id,
            completed: false,
            completed_at: None,
            progress: 0,
        });
        if !entry.completed {
            entry.progress = entry.progress.max(progress);
        }
        Ok(())
    }

    async fn find_completed(&self, user_id: Uuid) -> DbResult<Vec<UserAchievementRow>> {
        Ok(self
            .user_rows
            .iter()
            .filter(|r| r.user_id == user_id && r.completed)
            .map(|r| r.value().clone())
            .collect())
    }
}

/// In-memory usage ledger for testing
#[derive(Default, Clone)]
pub struct MockUsageRepository {
    events: Arc<Mutex<Vec<UsageEventRow>>>,
}

impl MockUsageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event at a fixed instant
    pub async fn seed_event(&self, user_id: Uuid, service: &str, occurred_at: DateTime<Utc>) {
        self.events.lock().await.push(UsageEventRow {
            id: Uuid::new_v4(),
            user_id,
            service: service.to_string(),
            count: 1,
            occurred_at,
        });
    }
}

#[async_trait]
impl UsageEventRepository for MockUsageRepository {
    async fn append(&self, event: CreateUsageEvent) -> DbResult<UsageEventRow> {
        let row = UsageEventRow {
            id: event.id,
            user_id: event.user_id,
            service: event.service,
            count: event.count,
            occurred_at: Utc::now(),
        };
        self.events.lock().await.push(row.clone());
        Ok(row)
    }

    async fn append_if_within(
        &self,
        event: CreateUsageEvent,
        _caps: ConsumeCaps,
    ) -> DbResult<ConsumeOutcome> {
        self.append(event).await?;
        Ok(ConsumeOutcome {
            recorded: true,
            used_hour: 0,
            used_month: 0,
        })
    }

    async fn count_since(
        &self,
        user_id: Uuid,
        service: &str,
        since: DateTime<Utc>,
    ) -> DbResult<i64> {
        let events = self.events.lock().await;
        Ok(events
            .iter()
            .filter(|e| e.user_id == user_id && e.service == service && e.occurred_at >= since)
            .map(|e| e.count)
            .sum())
    }

    async fn total_count(&self, user_id: Uuid, service: &str) -> DbResult<i64> {
        let events = self.events.lock().await;
        Ok(events
            .iter()
            .filter(|e| e.user_id == user_id && e.service == service)
            .map(|e| e.count)
            .sum())
    }

    async fn active_days(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<NaiveDate>> {
        let events = self.events.lock().await;
        let mut days: Vec<NaiveDate> = events
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.occurred_at.date_naive())
            .collect();
        days.sort_unstable();
        days.dedup();
        days.reverse();
        days.truncate(limit as usize);
        Ok(days)
    }

    async fn delete_for_user(&self, user_id: Uuid) -> DbResult<u64> {
        let mut events = self.events.lock().await;
        let before = events.len();
        events.retain(|e| e.user_id != user_id);
        Ok((before - events.len()) as u64)
    }
}
