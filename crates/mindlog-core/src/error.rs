// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Mindlog analysis pipeline.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{FeatureKey, Tier};

/// Classified failure of a call to the remote inference endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceFailure {
    /// The call did not complete within its per-call timeout.
    #[error("inference call timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Connection could not be established or was dropped mid-request.
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint answered with a 5xx status.
    #[error("inference server error (HTTP {status})")]
    Server { status: u16 },

    /// The endpoint answered with 429.
    #[error("inference endpoint rate limited the request")]
    RateLimited { retry_after: Option<Duration> },

    /// The endpoint rejected the request itself (4xx other than 429).
    #[error("inference request rejected (HTTP {status}): {message}")]
    Client { status: u16, message: String },

    /// The local admission scheduler backlog is at its high-water mark.
    #[error("admission backlog full, request dropped")]
    Overloaded,

    /// The admission scheduler has been shut down.
    #[error("admission scheduler is shut down")]
    Closed,
}

/// The primary error type used across every Mindlog crate.
#[derive(Debug, Error)]
pub enum MindlogError {
    /// Not enough source records (or otherwise unusable input) for the request.
    #[error("validation error: {0}")]
    Validation(String),

    /// The tier's usage cap for this feature is reached in the current window.
    #[error("quota exceeded for {feature}; next allowed at {next_allowed_at}")]
    QuotaExceeded {
        feature: FeatureKey,
        next_allowed_at: DateTime<Utc>,
    },

    /// The feature (or requested timeframe) is not offered on this tier.
    #[error("{feature} is not available on the {tier} plan")]
    FeatureUnavailable { feature: FeatureKey, tier: Tier },

    /// The external inference service failed after client-level retries.
    #[error("external service error: {0}")]
    Inference(#[from] InferenceFailure),

    /// Model output could not be turned into a structured result.
    #[error("decode error: {0}")]
    Decode(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MindlogError {
    /// Whether a background job hitting this error should be requeued with backoff.
    pub fn is_retryable(&self) -> bool {
        match self {
            MindlogError::Inference(failure) => !matches!(
                failure,
                InferenceFailure::Client { .. } | InferenceFailure::Closed
            ),
            MindlogError::Decode(_) | MindlogError::Storage { .. } => true,
            _ => false,
        }
    }

    /// Whether the inference client may transparently resend the same call.
    pub fn is_client_transient(&self) -> bool {
        matches!(
            self,
            MindlogError::Inference(InferenceFailure::Timeout { .. })
                | MindlogError::Inference(InferenceFailure::Network(_))
        )
    }

    /// Wraps any storage-layer error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        MindlogError::Storage {
            source: Box::new(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_and_timeout_are_client_transient() {
        let timeout = MindlogError::from(InferenceFailure::Timeout {
            duration: Duration::from_secs(120),
        });
        let network = MindlogError::from(InferenceFailure::Network("reset".into()));
        let server = MindlogError::from(InferenceFailure::Server { status: 503 });

        assert!(timeout.is_client_transient());
        assert!(network.is_client_transient());
        assert!(!server.is_client_transient());
    }

    #[test]
    fn client_errors_are_never_retried() {
        let rejected = MindlogError::from(InferenceFailure::Client {
            status: 400,
            message: "bad model".into(),
        });
        assert!(!rejected.is_retryable());
        assert!(!rejected.is_client_transient());
    }

    #[test]
    fn job_level_retry_covers_decode_and_server_failures() {
        assert!(MindlogError::Decode("no json".into()).is_retryable());
        assert!(MindlogError::from(InferenceFailure::Server { status: 502 }).is_retryable());
        assert!(
            MindlogError::from(InferenceFailure::RateLimited { retry_after: None }).is_retryable()
        );
        assert!(MindlogError::from(InferenceFailure::Overloaded).is_retryable());
        assert!(!MindlogError::Validation("too few".into()).is_retryable());
    }

    #[test]
    fn quota_error_mentions_next_allowed_time() {
        let at = DateTime::parse_from_rfc3339("2026-03-02T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let err = MindlogError::QuotaExceeded {
            feature: FeatureKey::Challenges,
            next_allowed_at: at,
        };
        let msg = err.to_string();
        assert!(msg.contains("challenges"), "got: {msg}");
        assert!(msg.contains("2026-03-02"), "got: {msg}");
    }
}
