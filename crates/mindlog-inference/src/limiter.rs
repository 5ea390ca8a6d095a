// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide admission scheduler for calls to the inference endpoint.
//!
//! Four rules gate every dispatch:
//! - a reservoir of tokens, reset to full on a fixed refill schedule;
//! - at most `max_concurrent` admitted calls in flight;
//! - a minimum gap between two consecutive dispatches;
//! - a bounded backlog: a request arriving while `high_water` requests are
//!   already waiting is rejected with [`InferenceFailure::Overloaded`].
//!
//! One instance is shared by every worker, so the limits are global.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use mindlog_config::model::LimiterConfig;
use mindlog_core::{InferenceFailure, MindlogError};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Limits applied by an [`AdmissionScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterSettings {
    pub reservoir: u32,
    pub refill_interval: Duration,
    pub max_concurrent: usize,
    pub min_spacing: Duration,
    pub high_water: usize,
}

impl From<&LimiterConfig> for LimiterSettings {
    fn from(config: &LimiterConfig) -> Self {
        Self {
            reservoir: config.reservoir,
            refill_interval: Duration::from_millis(config.refill_interval_ms),
            max_concurrent: config.max_concurrent,
            min_spacing: Duration::from_millis(config.min_spacing_ms),
            high_water: config.high_water,
        }
    }
}

struct State {
    tokens: u32,
    next_refill: Instant,
    last_dispatch: Option<Instant>,
    waiting: usize,
    closed: bool,
}

/// Shared token-bucket admission gate.
pub struct AdmissionScheduler {
    settings: LimiterSettings,
    state: Mutex<State>,
    slots: Arc<Semaphore>,
}

/// Proof of admission. The concurrency slot is released on drop.
#[derive(Debug)]
pub struct AdmissionPermit {
    _slot: OwnedSemaphorePermit,
}

impl AdmissionScheduler {
    pub fn new(settings: LimiterSettings) -> Self {
        let settings = LimiterSettings {
            max_concurrent: settings.max_concurrent.max(1),
            refill_interval: settings.refill_interval.max(Duration::from_millis(1)),
            ..settings
        };
        Self {
            state: Mutex::new(State {
                tokens: settings.reservoir,
                next_refill: Instant::now() + settings.refill_interval,
                last_dispatch: None,
                waiting: 0,
                closed: false,
            }),
            slots: Arc::new(Semaphore::new(settings.max_concurrent)),
            settings,
        }
    }

    pub fn from_config(config: &LimiterConfig) -> Self {
        Self::new(LimiterSettings::from(config))
    }

    pub fn settings(&self) -> LimiterSettings {
        self.settings
    }

    /// Requests admitted to the backlog but not yet dispatched.
    pub fn waiting(&self) -> usize {
        self.lock().waiting
    }

    /// Waits until every limit allows a dispatch.
    ///
    /// Fails immediately with `Overloaded` when the backlog is full, and with
    /// `Closed` once [`shutdown`](Self::shutdown) has been called.
    pub async fn acquire(&self) -> Result<AdmissionPermit, MindlogError> {
        let _backlog = self.enter_backlog()?;

        let slot = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| InferenceFailure::Closed)?;

        loop {
            let wake_at = {
                let mut state = self.lock();
                if state.closed {
                    return Err(InferenceFailure::Closed.into());
                }
                let now = Instant::now();
                if now >= state.next_refill {
                    let behind = now.duration_since(state.next_refill);
                    let periods = behind.as_nanos() / self.settings.refill_interval.as_nanos() + 1;
                    let periods = u32::try_from(periods).unwrap_or(u32::MAX);
                    state.next_refill += self.settings.refill_interval.saturating_mul(periods);
                    state.tokens = self.settings.reservoir;
                }

                let spaced_at = state
                    .last_dispatch
                    .map(|last| last + self.settings.min_spacing);

                if state.tokens == 0 {
                    state.next_refill
                } else if spaced_at.is_some_and(|at| at > now) {
                    spaced_at.unwrap_or(now)
                } else {
                    state.tokens -= 1;
                    state.last_dispatch = Some(now);
                    debug!(tokens_left = state.tokens, "inference call admitted");
                    return Ok(AdmissionPermit { _slot: slot });
                }
            };
            tokio::time::sleep_until(wake_at).await;
        }
    }

    /// Acquires admission, then runs `call` while holding it.
    pub async fn schedule<F, Fut, T>(&self, call: F) -> Result<T, MindlogError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, MindlogError>>,
    {
        let _permit = self.acquire().await?;
        call().await
    }

    /// Rejects all waiting and future requests.
    pub fn shutdown(&self) {
        self.lock().closed = true;
        self.slots.close();
        debug!("admission scheduler shut down");
    }

    fn enter_backlog(&self) -> Result<BacklogGuard<'_>, MindlogError> {
        let mut state = self.lock();
        if state.closed {
            return Err(InferenceFailure::Closed.into());
        }
        if state.waiting >= self.settings.high_water {
            warn!(
                waiting = state.waiting,
                high_water = self.settings.high_water,
                "admission backlog full, dropping request"
            );
            return Err(InferenceFailure::Overloaded.into());
        }
        state.waiting += 1;
        Ok(BacklogGuard { scheduler: self })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // State holds plain counters; a panic mid-update cannot leave it torn.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Counts a request in the backlog until it is dispatched or abandoned.
struct BacklogGuard<'a> {
    scheduler: &'a AdmissionScheduler,
}

impl Drop for BacklogGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.scheduler.lock();
        state.waiting = state.waiting.saturating_sub(1);
    }
}
