// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence traits consumed by the pipeline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::MindlogError;
use crate::types::{
    AnalysisJob, AnalysisResult, CacheEntry, EntryId, FeatureKey, JobId, JournalEntry, Tier,
    UserId,
};

/// Read access to journal entries.
#[async_trait]
pub trait EntryStore: Send + Sync + 'static {
    /// Fetches one entry, `None` if it no longer exists.
    async fn get_entry(&self, id: &EntryId) -> Result<Option<JournalEntry>, MindlogError>;

    /// Entries dated at or after `since` (all entries when `None`), oldest first.
    async fn find_by_user_since(
        &self,
        user: &UserId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<JournalEntry>, MindlogError>;

    /// The `limit` most recent entries, oldest first.
    async fn find_recent(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<JournalEntry>, MindlogError>;
}

/// Resolves a user's effective subscription tier.
#[async_trait]
pub trait PlanStore: Send + Sync + 'static {
    /// Expired plans resolve to [`Tier::Basic`]; unknown users too.
    async fn get_tier(&self, user: &UserId) -> Result<Tier, MindlogError>;
}

/// Usage counters keyed by (user, feature, window key).
///
/// Every mutation must be a single atomic statement.
#[async_trait]
pub trait UsageStore: Send + Sync + 'static {
    /// Current count, zero when no record exists yet.
    async fn get_count(
        &self,
        user: &UserId,
        feature: FeatureKey,
        window_key: &str,
    ) -> Result<u32, MindlogError>;

    /// Creates or increments the record unless it already holds `cap` uses.
    /// Returns the new count, or `None` if the cap was reached.
    async fn try_increment(
        &self,
        user: &UserId,
        feature: FeatureKey,
        window_key: &str,
        cap: Option<u32>,
    ) -> Result<Option<u32>, MindlogError>;

    /// Compensating correction for a reservation that was never realized.
    async fn decrement(
        &self,
        user: &UserId,
        feature: FeatureKey,
        window_key: &str,
    ) -> Result<(), MindlogError>;
}

/// Report cache keyed by (user, timeframe key).
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    async fn get(
        &self,
        user: &UserId,
        timeframe_key: &str,
    ) -> Result<Option<CacheEntry>, MindlogError>;

    /// Overwrites any prior entry. `generated_at` never moves backwards; the
    /// stored row is returned.
    async fn upsert(&self, entry: CacheEntry) -> Result<CacheEntry, MindlogError>;
}

/// One analysis result per entry, overwritten in place.
#[async_trait]
pub trait AnalysisStore: Send + Sync + 'static {
    async fn write_result(
        &self,
        entry: &EntryId,
        result: &AnalysisResult,
    ) -> Result<(), MindlogError>;

    /// Flags an existing result as outstanding again, or inserts a pending row.
    async fn mark_pending(&self, entry: &EntryId) -> Result<(), MindlogError>;

    async fn get_result(&self, entry: &EntryId) -> Result<Option<AnalysisResult>, MindlogError>;
}

/// Durable at-least-once job queue.
#[async_trait]
pub trait JobStore: Send + Sync + 'static {
    /// Persists a new job in `Queued`.
    async fn enqueue(
        &self,
        entry: &EntryId,
        max_attempts: u32,
        now: DateTime<Utc>,
    ) -> Result<AnalysisJob, MindlogError>;

    /// Atomically moves the oldest due `Queued` job to `Running`, bumping its
    /// attempt count and leasing it until `lease_until`.
    async fn claim_next(
        &self,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
    ) -> Result<Option<AnalysisJob>, MindlogError>;

    /// The settle methods below apply only while the job is `Running` under
    /// the given claimed `attempt`, and return `false` when it no longer is.
    /// A worker whose lease was reclaimed therefore cannot overwrite a later
    /// outcome or revive a terminal job.
    async fn mark_succeeded(
        &self,
        job: &JobId,
        attempt: u32,
        now: DateTime<Utc>,
    ) -> Result<bool, MindlogError>;

    /// Back to `Queued`, not claimable before `run_at`.
    async fn requeue(
        &self,
        job: &JobId,
        attempt: u32,
        run_at: DateTime<Utc>,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, MindlogError>;

    async fn mark_failed(
        &self,
        job: &JobId,
        attempt: u32,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, MindlogError>;

    /// Handles `Running` jobs whose lease expired before `now`: requeues those
    /// with attempts left and marks the rest `FailedTerminal`, returning them.
    async fn reclaim_expired(&self, now: DateTime<Utc>) -> Result<Vec<AnalysisJob>, MindlogError>;

    async fn get_job(&self, job: &JobId) -> Result<Option<AnalysisJob>, MindlogError>;

    /// Most recently enqueued job for an entry.
    async fn latest_for_entry(&self, entry: &EntryId)
    -> Result<Option<AnalysisJob>, MindlogError>;
}
