// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Mindlog.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use mindlog_core::{FeatureKey, Limit, Tier, TierRule, Timeframe, WindowKind};
use serde::{Deserialize, Serialize};

/// Top-level Mindlog configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MindlogConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Remote completion endpoint.
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Process-wide admission scheduler in front of the endpoint.
    #[serde(default)]
    pub limiter: LimiterConfig,

    /// Background worker pool.
    #[serde(default)]
    pub jobs: JobsConfig,

    /// Per-tier usage caps.
    #[serde(default)]
    pub quota: QuotaConfig,

    /// Report cache freshness.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Generation parameters for each pipeline.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    "mindlog.db".to_string()
}

fn default_true() -> bool {
    true
}

/// Inference endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InferenceConfig {
    /// Base URL of the OpenAI-compatible API; `/chat/completions` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token. `None` falls back to the `CHUTES_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for every tier unless `premium_model` is set.
    #[serde(default = "default_model")]
    pub model: String,

    /// Model used for premium-tier reports.
    #[serde(default)]
    pub premium_model: Option<String>,

    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Transparent resends on network or timeout failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First resend delay; doubles on each further resend.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            premium_model: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

impl InferenceConfig {
    /// Model to use for a request on behalf of `tier`.
    pub fn model_for(&self, tier: Tier) -> &str {
        match (&self.premium_model, tier) {
            (Some(pro), Tier::Premium) => pro,
            _ => &self.model,
        }
    }
}

fn default_base_url() -> String {
    "https://llm.chutes.ai/v1".to_string()
}

fn default_model() -> String {
    "Qwen/Qwen2.5-VL-32B-Instruct".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

/// Admission scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LimiterConfig {
    /// Tokens available per refill interval.
    #[serde(default = "default_reservoir")]
    pub reservoir: u32,

    /// The reservoir is reset to full on this period.
    #[serde(default = "default_refill_interval_ms")]
    pub refill_interval_ms: u64,

    /// Maximum calls in flight at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Minimum gap between two dispatches.
    #[serde(default = "default_min_spacing_ms")]
    pub min_spacing_ms: u64,

    /// Waiting requests beyond this count are rejected immediately.
    #[serde(default = "default_high_water")]
    pub high_water: usize,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            reservoir: default_reservoir(),
            refill_interval_ms: default_refill_interval_ms(),
            max_concurrent: default_max_concurrent(),
            min_spacing_ms: default_min_spacing_ms(),
            high_water: default_high_water(),
        }
    }
}

fn default_reservoir() -> u32 {
    10
}

fn default_refill_interval_ms() -> u64 {
    10_000
}

fn default_max_concurrent() -> usize {
    2
}

fn default_min_spacing_ms() -> u64 {
    1_000
}

fn default_high_water() -> usize {
    100
}

/// Background job configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JobsConfig {
    /// Number of concurrent workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Attempts per job before the fallback result is written.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each further retry.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// How often idle workers poll for due jobs.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// A running job whose worker vanished is reclaimed after this long.
    #[serde(default = "default_lease_secs")]
    pub lease_secs: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            lease_secs: default_lease_secs(),
        }
    }
}

fn default_workers() -> usize {
    5
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_base_ms() -> u64 {
    10_000
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_lease_secs() -> u64 {
    600
}

/// Usage caps for every gated feature.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaConfig {
    /// Whether a canned fallback result still consumes one use.
    #[serde(default = "default_true")]
    pub charge_on_fallback: bool,

    #[serde(default = "default_growth_quota")]
    pub growth: FeatureQuota,

    #[serde(default = "default_challenges_quota")]
    pub challenges: FeatureQuota,

    #[serde(default = "default_monthly_quota")]
    pub monthly: FeatureQuota,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            charge_on_fallback: true,
            growth: default_growth_quota(),
            challenges: default_challenges_quota(),
            monthly: default_monthly_quota(),
        }
    }
}

impl QuotaConfig {
    pub fn feature(&self, feature: FeatureKey) -> &FeatureQuota {
        match feature {
            FeatureKey::Growth => &self.growth,
            FeatureKey::Challenges => &self.challenges,
            FeatureKey::Monthly => &self.monthly,
        }
    }

    /// Static rule for `feature` on `tier`. Basic never gets gated features.
    pub fn rule(&self, feature: FeatureKey, tier: Tier) -> TierRule {
        let quota = self.feature(feature);
        let limit = match tier {
            Tier::Basic => Limit::Disabled,
            Tier::Standard => Limit::Capped(quota.standard_count),
            Tier::Premium => quota.premium_count.map_or(Limit::Unlimited, Limit::Capped),
        };
        TierRule {
            tier,
            window: quota.window,
            limit,
        }
    }
}

/// Cap for one feature.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureQuota {
    /// Accounting period ("daily" or "monthly").
    pub window: WindowKind,

    /// Uses per window on the standard tier.
    pub standard_count: u32,

    /// Uses per window on the premium tier. Absent means unlimited.
    #[serde(default)]
    pub premium_count: Option<u32>,
}

fn default_growth_quota() -> FeatureQuota {
    FeatureQuota {
        window: WindowKind::Daily,
        standard_count: 1,
        premium_count: None,
    }
}

fn default_challenges_quota() -> FeatureQuota {
    FeatureQuota {
        window: WindowKind::Daily,
        standard_count: 3,
        premium_count: None,
    }
}

fn default_monthly_quota() -> FeatureQuota {
    FeatureQuota {
        window: WindowKind::Monthly,
        standard_count: 2,
        premium_count: None,
    }
}

/// Report cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Freshness TTL of cached standard-tier reports.
    #[serde(default = "default_ttl_secs")]
    pub standard_ttl_secs: u64,

    /// Freshness TTL of cached premium-tier reports.
    #[serde(default = "default_ttl_secs")]
    pub premium_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            standard_ttl_secs: default_ttl_secs(),
            premium_ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl_for(&self, tier: Tier) -> chrono::Duration {
        let secs = match tier {
            Tier::Premium => self.premium_ttl_secs,
            _ => self.standard_ttl_secs,
        };
        i64::try_from(secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

fn default_ttl_secs() -> u64 {
    86_400
}

/// A value per report timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PerTimeframe<T> {
    pub week: T,
    pub month: T,
    pub year: T,
    pub all: T,
}

impl<T: Copy> PerTimeframe<T> {
    pub fn get(&self, timeframe: Timeframe) -> T {
        match timeframe {
            Timeframe::Week => self.week,
            Timeframe::Month => self.month,
            Timeframe::Year => self.year,
            Timeframe::All => self.all,
        }
    }
}

/// Generation parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    #[serde(default = "default_entry_temperature")]
    pub entry_temperature: f32,

    #[serde(default = "default_entry_max_tokens")]
    pub entry_max_tokens: u32,

    /// Sanitized entry text is cut to this many characters before prompting.
    #[serde(default = "default_entry_input_chars")]
    pub entry_input_chars: usize,

    #[serde(default = "default_report_temperature")]
    pub report_temperature: f32,

    /// Timeframes a standard-tier user may request.
    #[serde(default = "default_standard_timeframes")]
    pub standard_timeframes: Vec<Timeframe>,

    #[serde(default = "default_standard_min_records")]
    pub standard_min_records: usize,

    #[serde(default = "default_premium_min_records")]
    pub premium_min_records: usize,

    /// Entries included in a standard-tier digest.
    #[serde(default = "default_standard_summary_limit")]
    pub standard_summary_limit: usize,

    #[serde(default = "default_premium_summary_limits")]
    pub premium_summary_limits: PerTimeframe<usize>,

    #[serde(default = "default_standard_token_limit")]
    pub standard_token_limit: u32,

    #[serde(default = "default_premium_token_limits")]
    pub premium_token_limits: PerTimeframe<u32>,

    /// Characters kept from each entry body in a digest line.
    #[serde(default = "default_digest_entry_chars")]
    pub digest_entry_chars: usize,

    #[serde(default = "default_challenge_max_tokens")]
    pub challenge_max_tokens: u32,

    /// Most recent entries considered for challenges.
    #[serde(default = "default_challenge_entry_window")]
    pub challenge_entry_window: usize,

    #[serde(default = "default_monthly_max_tokens")]
    pub monthly_max_tokens: u32,

    #[serde(default = "default_monthly_window_days")]
    pub monthly_window_days: u32,

    /// Most recent entries searched for emotional triggers.
    #[serde(default = "default_patterns_entry_window")]
    pub patterns_entry_window: usize,

    #[serde(default = "default_patterns_max_tokens")]
    pub patterns_max_tokens: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            entry_temperature: default_entry_temperature(),
            entry_max_tokens: default_entry_max_tokens(),
            entry_input_chars: default_entry_input_chars(),
            report_temperature: default_report_temperature(),
            standard_timeframes: default_standard_timeframes(),
            standard_min_records: default_standard_min_records(),
            premium_min_records: default_premium_min_records(),
            standard_summary_limit: default_standard_summary_limit(),
            premium_summary_limits: default_premium_summary_limits(),
            standard_token_limit: default_standard_token_limit(),
            premium_token_limits: default_premium_token_limits(),
            digest_entry_chars: default_digest_entry_chars(),
            challenge_max_tokens: default_challenge_max_tokens(),
            challenge_entry_window: default_challenge_entry_window(),
            monthly_max_tokens: default_monthly_max_tokens(),
            monthly_window_days: default_monthly_window_days(),
            patterns_entry_window: default_patterns_entry_window(),
            patterns_max_tokens: default_patterns_max_tokens(),
        }
    }
}

fn default_entry_temperature() -> f32 {
    0.7
}

fn default_entry_max_tokens() -> u32 {
    512
}

fn default_entry_input_chars() -> usize {
    4_000
}

fn default_report_temperature() -> f32 {
    0.6
}

fn default_standard_timeframes() -> Vec<Timeframe> {
    vec![Timeframe::Week]
}

fn default_standard_min_records() -> usize {
    3
}

fn default_premium_min_records() -> usize {
    2
}

fn default_standard_summary_limit() -> usize {
    20
}

fn default_premium_summary_limits() -> PerTimeframe<usize> {
    PerTimeframe {
        week: 50,
        month: 80,
        year: 120,
        all: 150,
    }
}

fn default_standard_token_limit() -> u32 {
    700
}

fn default_premium_token_limits() -> PerTimeframe<u32> {
    PerTimeframe {
        week: 1_200,
        month: 1_500,
        year: 1_800,
        all: 1_800,
    }
}

fn default_digest_entry_chars() -> usize {
    300
}

fn default_challenge_max_tokens() -> u32 {
    400
}

fn default_challenge_entry_window() -> usize {
    40
}

fn default_monthly_max_tokens() -> u32 {
    700
}

fn default_monthly_window_days() -> u32 {
    30
}

fn default_patterns_entry_window() -> usize {
    50
}

fn default_patterns_max_tokens() -> u32 {
    700
}
