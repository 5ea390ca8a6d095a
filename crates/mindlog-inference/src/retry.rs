// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-level retry for transient inference failures.
//!
//! Only timeouts and network errors are resent. Server errors, rate limits
//! and client errors go straight back to the caller, which decides whether a
//! job-level retry is appropriate.

use std::time::Duration;

use mindlog_config::model::InferenceConfig;
use mindlog_core::MindlogError;
use rand::Rng;
use tracing::warn;

/// Bounded exponential retry with up to 20% random jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_config(config: &InferenceConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.retry_base_delay_ms),
        )
    }

    /// No resends at all.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before resend number `retry` (1-based), without jitter: `base * 2^retry`.
    pub fn base_delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.min(16)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    fn jittered_delay_for(&self, retry: u32) -> Duration {
        let delay = self.base_delay_for(retry);
        let jitter = rand::thread_rng().gen_range(0.0..=0.2);
        delay + delay.mul_f64(jitter)
    }

    /// Runs `op`, resending while it fails with a client-transient error.
    ///
    /// `op` receives the 0-based attempt number and is invoked at most
    /// `max_retries + 1` times.
    pub async fn run<F, Fut, T>(&self, mut op: F) -> Result<T, MindlogError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, MindlogError>>,
    {
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_client_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.jittered_delay_for(attempt);
                    warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying inference call");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
