// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inference client for the Mindlog analysis pipeline.
//!
//! Wraps an OpenAI-compatible chat completions endpoint behind a shared
//! [`AdmissionScheduler`] and a bounded [`RetryPolicy`], and classifies every
//! failure into the core inference taxonomy.

pub mod client;
pub mod limiter;
pub mod retry;
pub mod types;

use std::sync::Arc;

use mindlog_config::MindlogConfig;
use mindlog_core::MindlogError;
use tracing::info;

pub use client::ChatClient;
pub use limiter::{AdmissionPermit, AdmissionScheduler, LimiterSettings};
pub use retry::RetryPolicy;

/// Environment variable consulted when `inference.api_key` is unset.
pub const API_KEY_ENV: &str = "CHUTES_API_KEY";

/// Builds the client described by the configuration, sharing `scheduler`.
///
/// API key resolution order: `inference.api_key` -> `CHUTES_API_KEY` -> error.
pub fn client_from_config(
    config: &MindlogConfig,
    scheduler: Arc<AdmissionScheduler>,
) -> Result<ChatClient, MindlogError> {
    let api_key = resolve_api_key(&config.inference.api_key)?;
    let client = ChatClient::new(
        &config.inference.base_url,
        &api_key,
        scheduler,
        RetryPolicy::from_config(&config.inference),
    )?;
    info!(
        endpoint = client.endpoint(),
        model = %config.inference.model,
        "inference client initialized"
    );
    Ok(client)
}

fn resolve_api_key(config_key: &Option<String>) -> Result<String, MindlogError> {
    match config_key {
        Some(key) if !key.is_empty() => Ok(key.clone()),
        _ => std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                MindlogError::Config(format!(
                    "inference API key not found. Set inference.api_key in config or {API_KEY_ENV} environment variable."
                ))
            }),
    }
}
