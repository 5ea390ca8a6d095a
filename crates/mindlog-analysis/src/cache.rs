// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Freshness-bounded report cache over a [`CacheStore`].

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use mindlog_config::model::CacheConfig;
use mindlog_core::{CacheEntry, CacheStore, Clock, MindlogError, Tier, UserId};
use tracing::debug;

pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStore>, config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            config,
            clock,
        }
    }

    pub fn ttl(&self, tier: Tier) -> Duration {
        self.config.ttl_for(tier)
    }

    /// Moment a report generated at `generated_at` stops being fresh.
    pub fn expires_at(&self, generated_at: DateTime<Utc>, tier: Tier) -> DateTime<Utc> {
        generated_at
            .checked_add_signed(self.ttl(tier))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_fresh(&self, entry: &CacheEntry, tier: Tier) -> bool {
        self.clock.now() < self.expires_at(entry.generated_at, tier)
    }

    pub async fn get(
        &self,
        user: &UserId,
        timeframe_key: &str,
    ) -> Result<Option<CacheEntry>, MindlogError> {
        self.store.get(user, timeframe_key).await
    }

    /// The stored entry if it may be served instead of regenerating.
    ///
    /// A forced refresh always misses.
    pub async fn lookup(
        &self,
        user: &UserId,
        timeframe_key: &str,
        tier: Tier,
        force: bool,
    ) -> Result<Option<CacheEntry>, MindlogError> {
        if force {
            debug!(user = %user, timeframe = timeframe_key, "cache bypassed by forced refresh");
            return Ok(None);
        }
        let hit = self
            .get(user, timeframe_key)
            .await?
            .filter(|entry| self.is_fresh(entry, tier));
        debug!(user = %user, timeframe = timeframe_key, hit = hit.is_some(), "cache lookup");
        Ok(hit)
    }

    /// Stores `data` as generated now, replacing any earlier entry.
    pub async fn put(
        &self,
        user: &UserId,
        timeframe_key: &str,
        data: serde_json::Value,
    ) -> Result<CacheEntry, MindlogError> {
        self.store
            .upsert(CacheEntry {
                user_id: user.clone(),
                timeframe_key: timeframe_key.to_string(),
                data,
                generated_at: self.clock.now(),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use mindlog_storage::SqliteStorage;
    use mindlog_test_utils::ManualClock;
    use serde_json::json;

    use super::*;

    async fn cache() -> (ResultCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at("2026-03-10T12:00:00Z"));
        let storage = SqliteStorage::in_memory().await.unwrap();
        let cache = ResultCache::new(Arc::new(storage), CacheConfig::default(), clock.clone());
        (cache, clock)
    }

    #[tokio::test]
    async fn fresh_entry_is_served_until_ttl() {
        let (cache, clock) = cache().await;
        let user = UserId("u1".into());
        let stored = cache.put(&user, "week", json!({"a": 1})).await.unwrap();

        clock.advance(Duration::hours(23));
        let hit = cache.lookup(&user, "week", Tier::Standard, false).await.unwrap();
        assert_eq!(hit.map(|e| e.generated_at), Some(stored.generated_at));

        clock.advance(Duration::hours(1));
        assert!(cache.lookup(&user, "week", Tier::Standard, false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn forced_lookup_always_misses() {
        let (cache, _clock) = cache().await;
        let user = UserId("u1".into());
        cache.put(&user, "week", json!({})).await.unwrap();
        assert!(cache.lookup(&user, "week", Tier::Premium, true).await.unwrap().is_none());
        assert!(cache.lookup(&user, "week", Tier::Premium, false).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn put_overwrites_and_advances_generated_at() {
        let (cache, clock) = cache().await;
        let user = UserId("u1".into());
        let first = cache.put(&user, "month", json!({"v": 1})).await.unwrap();
        clock.advance(Duration::minutes(5));
        let second = cache.put(&user, "month", json!({"v": 2})).await.unwrap();

        assert!(second.generated_at > first.generated_at);
        let stored = cache.get(&user, "month").await.unwrap().unwrap();
        assert_eq!(stored.data, json!({"v": 2}));
    }

    #[tokio::test]
    async fn expiry_is_generated_at_plus_ttl() {
        let (cache, clock) = cache().await;
        assert_eq!(
            cache.expires_at(clock.now(), Tier::Standard),
            clock.now() + Duration::hours(24)
        );
    }
}
