// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;

use mindlog_config::model::JobsConfig;

/// Runtime settings for the worker pool.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub workers: usize,
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub poll_interval: Duration,
    pub lease: Duration,
    /// How often expired leases are swept while running.
    pub reclaim_interval: Duration,
}

impl From<&JobsConfig> for PoolSettings {
    fn from(config: &JobsConfig) -> Self {
        let poll_interval = Duration::from_millis(config.poll_interval_ms);
        let lease = Duration::from_secs(config.lease_secs);
        Self {
            workers: config.workers.max(1),
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            poll_interval,
            lease,
            reclaim_interval: (lease / 4).max(poll_interval),
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self::from(&JobsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_jobs_config() {
        let settings = PoolSettings::default();
        assert_eq!(settings.workers, 5);
        assert_eq!(settings.max_attempts, 5);
        assert_eq!(settings.backoff_base, Duration::from_secs(10));
        assert_eq!(settings.lease, Duration::from_secs(600));
        assert_eq!(settings.reclaim_interval, Duration::from_secs(150));
    }

    #[test]
    fn reclaim_never_runs_faster_than_polling() {
        let config = JobsConfig {
            lease_secs: 1,
            poll_interval_ms: 2_000,
            workers: 0,
            ..JobsConfig::default()
        };
        let settings = PoolSettings::from(&config);
        assert_eq!(settings.reclaim_interval, Duration::from_secs(2));
        assert_eq!(settings.workers, 1);
    }
}
