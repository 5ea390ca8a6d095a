// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./mindlog.toml` > `~/.config/mindlog/mindlog.toml` > `/etc/mindlog/mindlog.toml`
//! with environment variable overrides via `MINDLOG_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::MindlogConfig;

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/mindlog/mindlog.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "mindlog.toml";
pub(crate) const XDG_CONFIG_SUFFIX: &str = "mindlog/mindlog.toml";

/// Env key prefixes (after `MINDLOG_` is stripped) and the dotted path they map to.
/// Nested sections come before their parents so the longest prefix wins.
const ENV_SECTIONS: &[(&str, &str)] = &[
    ("quota_growth_", "quota.growth."),
    ("quota_challenges_", "quota.challenges."),
    ("quota_monthly_", "quota.monthly."),
    ("logging_", "logging."),
    ("storage_", "storage."),
    ("inference_", "inference."),
    ("limiter_", "limiter."),
    ("jobs_", "jobs."),
    ("quota_", "quota."),
    ("cache_", "cache."),
    ("analysis_", "analysis."),
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/mindlog/mindlog.toml` (system-wide)
/// 3. `~/.config/mindlog/mindlog.toml` (user XDG config)
/// 4. `./mindlog.toml` (local directory)
/// 5. `MINDLOG_*` environment variables
pub fn load_config() -> Result<MindlogConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<MindlogConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MindlogConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MindlogConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MindlogConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MindlogConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join(XDG_CONFIG_SUFFIX))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Maps an env key (prefix stripped, any case) to its dotted config path.
///
/// Only the section separator becomes a dot, so `INFERENCE_API_KEY` maps to
/// `inference.api_key`, not `inference.api.key`.
pub fn env_key_to_path(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for (prefix, dotted) in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(prefix) {
            return format!("{dotted}{rest}");
        }
    }
    key
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
fn env_provider() -> Env {
    Env::prefixed("MINDLOG_").map(|key| env_key_to_path(key.as_str()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_only_at_section() {
        assert_eq!(env_key_to_path("inference_api_key"), "inference.api_key");
        assert_eq!(env_key_to_path("jobs_max_attempts"), "jobs.max_attempts");
        assert_eq!(
            env_key_to_path("limiter_min_spacing_ms"),
            "limiter.min_spacing_ms"
        );
    }

    #[test]
    fn nested_quota_sections_take_precedence() {
        assert_eq!(
            env_key_to_path("quota_challenges_standard_count"),
            "quota.challenges.standard_count"
        );
        assert_eq!(
            env_key_to_path("quota_charge_on_fallback"),
            "quota.charge_on_fallback"
        );
    }

    #[test]
    fn env_keys_arrive_uppercase() {
        assert_eq!(env_key_to_path("INFERENCE_API_KEY"), "inference.api_key");
        assert_eq!(
            env_key_to_path("QUOTA_GROWTH_PREMIUM_COUNT"),
            "quota.growth.premium_count"
        );
    }

    #[test]
    fn unknown_sections_pass_through() {
        assert_eq!(env_key_to_path("bogus"), "bogus");
    }
}
