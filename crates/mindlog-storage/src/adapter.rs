// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of every collaborator store trait.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use mindlog_config::model::StorageConfig;
use mindlog_core::{
    AnalysisJob, AnalysisResult, AnalysisStore, CacheEntry, CacheStore, Clock, EntryId,
    EntryStore, FeatureKey, JobId, JobStore, JournalEntry, MindlogError, PlanStore, SystemClock,
    Tier, UsageStore, UserId,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage.
///
/// Wraps a [`Database`] handle and delegates to the typed query modules.
/// Cheap to clone; clones share the single background connection.
#[derive(Clone)]
pub struct SqliteStorage {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl SqliteStorage {
    /// Opens the database named by the storage config.
    pub async fn open(config: &StorageConfig) -> Result<Self, MindlogError> {
        let db = Database::open_with(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite storage initialized");
        Ok(Self::from_database(db))
    }

    /// Private in-memory storage.
    pub async fn in_memory() -> Result<Self, MindlogError> {
        Ok(Self::from_database(Database::open_in_memory().await?))
    }

    pub fn from_database(db: Database) -> Self {
        Self {
            db,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used for plan expiry and row timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // --- Writes owned by outer collaborators, exposed for the CLI and tests ---

    pub async fn upsert_user(
        &self,
        user: &UserId,
        tier: Tier,
        plan_expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), MindlogError> {
        queries::users::upsert_user(&self.db, user, tier, plan_expires_at).await
    }

    pub async fn upsert_entry(&self, entry: &JournalEntry) -> Result<(), MindlogError> {
        queries::entries::upsert_entry(&self.db, entry).await
    }

    pub async fn job_counts(&self) -> Result<BTreeMap<String, i64>, MindlogError> {
        queries::jobs::count_by_status(&self.db).await
    }

    /// Checkpoints the WAL so the database file is self-contained.
    pub async fn close(&self) -> Result<(), MindlogError> {
        self.db.close().await
    }
}

#[async_trait]
impl EntryStore for SqliteStorage {
    async fn get_entry(&self, id: &EntryId) -> Result<Option<JournalEntry>, MindlogError> {
        queries::entries::get_entry(&self.db, id).await
    }

    async fn find_by_user_since(
        &self,
        user: &UserId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<JournalEntry>, MindlogError> {
        queries::entries::find_by_user_since(&self.db, user, since).await
    }

    async fn find_recent(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<JournalEntry>, MindlogError> {
        queries::entries::find_recent(&self.db, user, limit).await
    }
}

#[async_trait]
impl PlanStore for SqliteStorage {
    async fn get_tier(&self, user: &UserId) -> Result<Tier, MindlogError> {
        queries::users::effective_tier(&self.db, user, self.clock.now()).await
    }
}

#[async_trait]
impl UsageStore for SqliteStorage {
    async fn get_count(
        &self,
        user: &UserId,
        feature: FeatureKey,
        window_key: &str,
    ) -> Result<u32, MindlogError> {
        queries::usage::get_count(&self.db, user, feature, window_key).await
    }

    async fn try_increment(
        &self,
        user: &UserId,
        feature: FeatureKey,
        window_key: &str,
        cap: Option<u32>,
    ) -> Result<Option<u32>, MindlogError> {
        queries::usage::try_increment(&self.db, user, feature, window_key, cap, self.clock.now())
            .await
    }

    async fn decrement(
        &self,
        user: &UserId,
        feature: FeatureKey,
        window_key: &str,
    ) -> Result<(), MindlogError> {
        queries::usage::decrement(&self.db, user, feature, window_key, self.clock.now()).await
    }
}

#[async_trait]
impl CacheStore for SqliteStorage {
    async fn get(
        &self,
        user: &UserId,
        timeframe_key: &str,
    ) -> Result<Option<CacheEntry>, MindlogError> {
        queries::cache::get(&self.db, user, timeframe_key).await
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<CacheEntry, MindlogError> {
        queries::cache::upsert(&self.db, entry).await
    }
}

#[async_trait]
impl AnalysisStore for SqliteStorage {
    async fn write_result(
        &self,
        entry: &EntryId,
        result: &AnalysisResult,
    ) -> Result<(), MindlogError> {
        queries::results::write_result(&self.db, entry, result, self.clock.now()).await
    }

    async fn mark_pending(&self, entry: &EntryId) -> Result<(), MindlogError> {
        queries::results::mark_pending(&self.db, entry, self.clock.now()).await
    }

    async fn get_result(&self, entry: &EntryId) -> Result<Option<AnalysisResult>, MindlogError> {
        queries::results::get_result(&self.db, entry).await
    }
}

#[async_trait]
impl JobStore for SqliteStorage {
    async fn enqueue(
        &self,
        entry: &EntryId,
        max_attempts: u32,
        now: DateTime<Utc>,
    ) -> Result<AnalysisJob, MindlogError> {
        queries::jobs::enqueue(&self.db, entry, max_attempts, now).await
    }

    async fn claim_next(
        &self,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
    ) -> Result<Option<AnalysisJob>, MindlogError> {
        queries::jobs::claim_next(&self.db, now, lease_until).await
    }

    async fn mark_succeeded(
        &self,
        job: &JobId,
        attempt: u32,
        now: DateTime<Utc>,
    ) -> Result<bool, MindlogError> {
        queries::jobs::mark_succeeded(&self.db, job, attempt, now).await
    }

    async fn requeue(
        &self,
        job: &JobId,
        attempt: u32,
        run_at: DateTime<Utc>,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, MindlogError> {
        queries::jobs::requeue(&self.db, job, attempt, run_at, error, now).await
    }

    async fn mark_failed(
        &self,
        job: &JobId,
        attempt: u32,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, MindlogError> {
        queries::jobs::mark_failed(&self.db, job, attempt, error, now).await
    }

    async fn reclaim_expired(&self, now: DateTime<Utc>) -> Result<Vec<AnalysisJob>, MindlogError> {
        queries::jobs::reclaim_expired(&self.db, now).await
    }

    async fn get_job(&self, job: &JobId) -> Result<Option<AnalysisJob>, MindlogError> {
        queries::jobs::get_job(&self.db, job).await
    }

    async fn latest_for_entry(
        &self,
        entry: &EntryId,
    ) -> Result<Option<AnalysisJob>, MindlogError> {
        queries::jobs::latest_for_entry(&self.db, entry).await
    }
}
