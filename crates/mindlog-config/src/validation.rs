// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as positive limits, consistent scheduler timings, and sane temperatures.

use mindlog_core::FeatureKey;

use crate::diagnostic::ConfigError;
use crate::model::MindlogConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Ten years; longer TTLs are certainly a unit mistake.
const MAX_TTL_SECS: u64 = 10 * 365 * 86_400;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &MindlogConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let level = config.logging.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail(format!(
            "logging.level `{}` must be one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let inference = &config.inference;
    if !(inference.base_url.starts_with("http://") || inference.base_url.starts_with("https://"))
    {
        fail(format!(
            "inference.base_url `{}` must start with http:// or https://",
            inference.base_url
        ));
    }
    if inference.model.trim().is_empty() {
        fail("inference.model must not be empty".to_string());
    }
    if matches!(&inference.premium_model, Some(m) if m.trim().is_empty()) {
        fail("inference.premium_model must not be empty when set".to_string());
    }
    if inference.timeout_secs == 0 {
        fail("inference.timeout_secs must be greater than 0".to_string());
    }

    let limiter = &config.limiter;
    if limiter.reservoir == 0 {
        fail("limiter.reservoir must be greater than 0".to_string());
    }
    if limiter.refill_interval_ms == 0 {
        fail("limiter.refill_interval_ms must be greater than 0".to_string());
    }
    if limiter.max_concurrent == 0 {
        fail("limiter.max_concurrent must be greater than 0".to_string());
    }
    if limiter.high_water == 0 {
        fail("limiter.high_water must be greater than 0".to_string());
    }
    if limiter.min_spacing_ms > limiter.refill_interval_ms {
        fail(format!(
            "limiter.min_spacing_ms ({}) must not exceed limiter.refill_interval_ms ({})",
            limiter.min_spacing_ms, limiter.refill_interval_ms
        ));
    }

    let jobs = &config.jobs;
    if jobs.workers == 0 {
        fail("jobs.workers must be greater than 0".to_string());
    }
    if jobs.max_attempts == 0 {
        fail("jobs.max_attempts must be at least 1".to_string());
    }
    if jobs.backoff_base_ms == 0 {
        fail("jobs.backoff_base_ms must be greater than 0".to_string());
    }
    if jobs.poll_interval_ms == 0 {
        fail("jobs.poll_interval_ms must be greater than 0".to_string());
    }
    if jobs.lease_secs <= inference.timeout_secs {
        fail(format!(
            "jobs.lease_secs ({}) must exceed inference.timeout_secs ({})",
            jobs.lease_secs, inference.timeout_secs
        ));
    }

    for feature in [FeatureKey::Growth, FeatureKey::Challenges, FeatureKey::Monthly] {
        let quota = config.quota.feature(feature);
        if quota.standard_count == 0 {
            fail(format!(
                "quota.{feature}.standard_count must be greater than 0"
            ));
        }
        if quota.premium_count == Some(0) {
            fail(format!(
                "quota.{feature}.premium_count must be greater than 0 when set"
            ));
        }
    }

    for (key, ttl) in [
        ("cache.standard_ttl_secs", config.cache.standard_ttl_secs),
        ("cache.premium_ttl_secs", config.cache.premium_ttl_secs),
    ] {
        if ttl == 0 || ttl > MAX_TTL_SECS {
            fail(format!("{key} must be between 1 and {MAX_TTL_SECS}, got {ttl}"));
        }
    }

    let analysis = &config.analysis;
    for (key, temperature) in [
        ("analysis.entry_temperature", analysis.entry_temperature),
        ("analysis.report_temperature", analysis.report_temperature),
    ] {
        if !(0.0..=2.0).contains(&temperature) {
            fail(format!("{key} must be within 0.0..=2.0, got {temperature}"));
        }
    }
    if analysis.standard_timeframes.is_empty() {
        fail("analysis.standard_timeframes must list at least one timeframe".to_string());
    }
    if analysis.standard_min_records == 0 || analysis.premium_min_records == 0 {
        fail("analysis min_records values must be at least 1".to_string());
    }
    if analysis.standard_summary_limit < analysis.standard_min_records {
        fail(format!(
            "analysis.standard_summary_limit ({}) must be at least standard_min_records ({})",
            analysis.standard_summary_limit, analysis.standard_min_records
        ));
    }
    if analysis.entry_input_chars == 0 || analysis.digest_entry_chars == 0 {
        fail("analysis character limits must be greater than 0".to_string());
    }
    if analysis.challenge_entry_window == 0 {
        fail("analysis.challenge_entry_window must be greater than 0".to_string());
    }
    if analysis.patterns_entry_window == 0 {
        fail("analysis.patterns_entry_window must be greater than 0".to_string());
    }
    if analysis.monthly_window_days == 0 {
        fail("analysis.monthly_window_days must be greater than 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
