// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle event sinks.

use std::sync::Arc;

use mindlog_core::{JobEvent, JobObserver};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Logs every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl JobObserver for TracingObserver {
    fn on_event(&self, event: &JobEvent) {
        match event {
            JobEvent::Enqueued { job_id, entry_id } => {
                debug!(job = %job_id, entry = %entry_id, "job enqueued");
            }
            JobEvent::Started { job_id, attempt } => {
                debug!(job = %job_id, attempt, "job started");
            }
            JobEvent::Succeeded { job_id, attempt } => {
                info!(job = %job_id, attempt, "job succeeded");
            }
            JobEvent::Retried {
                job_id,
                attempt,
                delay,
                error,
            } => {
                warn!(job = %job_id, attempt, delay_ms = delay.as_millis() as u64, error = %error, "job will be retried");
            }
            JobEvent::Exhausted {
                job_id,
                attempts,
                error,
            } => {
                warn!(job = %job_id, attempts, error = %error, "job exhausted, fallback written");
            }
        }
    }
}

/// Rebroadcasts events to any number of async subscribers.
///
/// Slow subscribers lag and lose the oldest events rather than blocking workers.
#[derive(Debug, Clone)]
pub struct EventChannel {
    tx: broadcast::Sender<JobEvent>,
}

impl EventChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new(256)
    }
}

impl JobObserver for EventChannel {
    fn on_event(&self, event: &JobEvent) {
        // No subscribers is fine.
        let _ = self.tx.send(event.clone());
    }
}

/// Shared, fixed set of observers.
#[derive(Clone, Default)]
pub(crate) struct Observers(Arc<[Arc<dyn JobObserver>]>);

impl Observers {
    pub(crate) fn new(observers: Vec<Arc<dyn JobObserver>>) -> Self {
        Self(observers.into())
    }

    pub(crate) fn emit(&self, event: JobEvent) {
        for observer in self.0.iter() {
            observer.on_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use mindlog_core::{EntryId, JobId};
    use tracing_test::traced_test;

    use super::*;

    fn enqueued() -> JobEvent {
        JobEvent::Enqueued {
            job_id: JobId("j1".into()),
            entry_id: EntryId("e1".into()),
        }
    }

    #[tokio::test]
    async fn channel_fans_out_to_subscribers() {
        let channel = EventChannel::new(8);
        let mut a = channel.subscribe();
        let mut b = channel.subscribe();
        let observers = Observers::new(vec![Arc::new(channel.clone()), Arc::new(TracingObserver)]);

        observers.emit(enqueued());
        assert_eq!(a.recv().await.unwrap(), enqueued());
        assert_eq!(b.recv().await.unwrap().job_id(), &JobId("j1".into()));
    }

    #[test]
    #[traced_test]
    fn tracing_observer_logs_retries() {
        TracingObserver.on_event(&JobEvent::Retried {
            job_id: JobId("j7".into()),
            attempt: 2,
            delay: std::time::Duration::from_secs(20),
            error: "inference server error (HTTP 503)".into(),
        });
        assert!(logs_contain("job will be retried"));
        assert!(logs_contain("delay_ms=20000"));
    }

    #[test]
    fn sending_without_subscribers_is_silent() {
        EventChannel::default().on_event(&enqueued());
    }
}
