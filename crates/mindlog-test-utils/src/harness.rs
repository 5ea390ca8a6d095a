// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for integration testing.
//!
//! `TestHarness` assembles the collaborators every pipeline component needs:
//! a temp SQLite database, a scripted inference provider, a manual clock, and
//! a default configuration. Services under test are built from its parts.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use mindlog_config::MindlogConfig;
use mindlog_config::model::StorageConfig;
use mindlog_core::{Clock, EntryId, JournalEntry, MindlogError, Tier, UserId};
use mindlog_storage::SqliteStorage;

use crate::clock::ManualClock;
use crate::mock_inference::{MockInference, MockReply};

/// Default instant harness clocks start at.
pub const DEFAULT_NOW: &str = "2026-03-10T12:00:00Z";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    replies: Vec<MockReply>,
    now: Option<DateTime<Utc>>,
    config: MindlogConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            now: None,
            config: MindlogConfig::default(),
        }
    }

    /// Set scripted inference replies.
    pub fn with_replies<I, R>(mut self, replies: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<MockReply>,
    {
        self.replies = replies.into_iter().map(Into::into).collect();
        self
    }

    /// Start the clock at `now` instead of [`DEFAULT_NOW`].
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Adjust the configuration before the harness is built.
    pub fn configure(mut self, f: impl FnOnce(&mut MindlogConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// Build the test harness, creating all required collaborators.
    pub async fn build(self) -> Result<TestHarness, MindlogError> {
        let temp_dir = tempfile::TempDir::new().map_err(MindlogError::storage)?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        };

        let clock = Arc::new(match self.now {
            Some(now) => ManualClock::new(now),
            None => ManualClock::at(DEFAULT_NOW),
        });
        let storage = SqliteStorage::open(&config.storage)
            .await?
            .with_clock(clock.clone());

        Ok(TestHarness {
            storage: Arc::new(storage),
            inference: Arc::new(MockInference::with_replies(self.replies)),
            clock,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A test environment with temp storage and scripted inference.
pub struct TestHarness {
    /// SQLite storage (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// The scripted inference provider.
    pub inference: Arc<MockInference>,
    /// Clock shared with storage for plan-expiry checks.
    pub clock: Arc<ManualClock>,
    pub config: MindlogConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Creates a user on `tier`. Paid plans expire thirty days after the clock.
    pub async fn add_user(&self, id: &str, tier: Tier) -> Result<UserId, MindlogError> {
        let user = UserId(id.to_string());
        let expires = (tier > Tier::Basic).then(|| self.now() + Duration::days(30));
        self.storage.upsert_user(&user, tier, expires).await?;
        Ok(user)
    }

    /// Stores one entry dated `age` before the clock.
    pub async fn add_entry(
        &self,
        user: &UserId,
        age: Duration,
        content: &str,
        mood_score: Option<u8>,
    ) -> Result<JournalEntry, MindlogError> {
        let entry = JournalEntry {
            id: EntryId(uuid::Uuid::new_v4().to_string()),
            user_id: user.clone(),
            date: self.now() - age,
            content: content.to_string(),
            mood_score,
        };
        self.storage.upsert_entry(&entry).await?;
        Ok(entry)
    }

    /// Stores `n` entries, one per day ending yesterday, moods cycling 4..=8.
    pub async fn add_entries(
        &self,
        user: &UserId,
        n: usize,
    ) -> Result<Vec<JournalEntry>, MindlogError> {
        let mut entries = Vec::with_capacity(n);
        for i in 0..n {
            let days_ago = i64::try_from(n - i).unwrap_or(i64::MAX);
            let mood = 4 + u8::try_from(i % 5).unwrap_or(0);
            entries.push(
                self.add_entry(
                    user,
                    Duration::days(days_ago),
                    &format!("Day {} of journaling.", i + 1),
                    Some(mood),
                )
                .await?,
            );
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindlog_core::{EntryStore, PlanStore};

    #[tokio::test]
    async fn builder_creates_working_environment() {
        let harness = TestHarness::builder().build().await.unwrap();
        let user = harness.add_user("u1", Tier::Standard).await.unwrap();
        assert_eq!(harness.storage.get_tier(&user).await.unwrap(), Tier::Standard);
    }

    #[tokio::test]
    async fn plan_expiry_follows_harness_clock() {
        let harness = TestHarness::builder().build().await.unwrap();
        let user = harness.add_user("u1", Tier::Premium).await.unwrap();
        harness.clock.advance(Duration::days(31));
        assert_eq!(harness.storage.get_tier(&user).await.unwrap(), Tier::Basic);
    }

    #[tokio::test]
    async fn add_entries_are_dated_before_now() {
        let harness = TestHarness::builder().build().await.unwrap();
        let user = harness.add_user("u1", Tier::Basic).await.unwrap();
        harness.add_entries(&user, 3).await.unwrap();

        let week = harness
            .storage
            .find_by_user_since(&user, Some(harness.now() - Duration::days(7)))
            .await
            .unwrap();
        assert_eq!(week.len(), 3);
        assert!(week.iter().all(|e| e.date < harness.now()));
    }

    #[tokio::test]
    async fn configure_overrides_defaults() {
        let harness = TestHarness::builder()
            .configure(|c| c.jobs.workers = 1)
            .build()
            .await
            .unwrap();
        assert_eq!(harness.config.jobs.workers, 1);
    }
}
