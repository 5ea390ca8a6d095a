// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker pool that drains the analysis queue.
//!
//! Each worker claims one due job at a time under a lease, runs the
//! [`EntryAnalyzer`], and settles the job: succeeded, requeued with backoff,
//! or failed terminally with the fallback result written. A maintenance task
//! sweeps expired leases. Cancellation is observed between jobs, so a job in
//! flight finishes before its worker exits.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mindlog_analysis::{EntryAnalyzer, EntryOutcome};
use mindlog_core::{
    AnalysisJob, AnalysisStore, Clock, JobEvent, JobObserver, JobStore, MindlogError,
};
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backoff::backoff_delay;
use crate::events::Observers;
use crate::queue::JobQueue;
use crate::settings::PoolSettings;

/// Builder for [`WorkerPool`].
pub struct WorkerPoolBuilder {
    jobs: Arc<dyn JobStore>,
    results: Arc<dyn AnalysisStore>,
    analyzer: Arc<EntryAnalyzer>,
    clock: Arc<dyn Clock>,
    settings: PoolSettings,
    observers: Vec<Arc<dyn JobObserver>>,
}

impl WorkerPoolBuilder {
    pub fn with_settings(mut self, settings: PoolSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn JobObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn build(self) -> WorkerPool {
        WorkerPool {
            inner: Arc::new(PoolInner {
                jobs: self.jobs,
                results: self.results,
                analyzer: self.analyzer,
                clock: self.clock,
                settings: self.settings,
                notify: Arc::new(Notify::new()),
                observers: Observers::new(self.observers),
            }),
        }
    }
}

/// A fixed-size pool of analysis workers.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    jobs: Arc<dyn JobStore>,
    results: Arc<dyn AnalysisStore>,
    analyzer: Arc<EntryAnalyzer>,
    clock: Arc<dyn Clock>,
    settings: PoolSettings,
    notify: Arc<Notify>,
    observers: Observers,
}

impl WorkerPool {
    pub fn builder(
        jobs: Arc<dyn JobStore>,
        results: Arc<dyn AnalysisStore>,
        analyzer: Arc<EntryAnalyzer>,
        clock: Arc<dyn Clock>,
    ) -> WorkerPoolBuilder {
        WorkerPoolBuilder {
            jobs,
            results,
            analyzer,
            clock,
            settings: PoolSettings::default(),
            observers: Vec::new(),
        }
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.inner.settings
    }

    /// A producer handle whose enqueues wake this pool's idle workers.
    pub fn queue(&self) -> JobQueue {
        JobQueue {
            jobs: self.inner.jobs.clone(),
            results: self.inner.results.clone(),
            clock: self.inner.clock.clone(),
            notify: self.inner.notify.clone(),
            observers: self.inner.observers.clone(),
            max_attempts: self.inner.settings.max_attempts,
        }
    }

    /// Reclaims leases left by a previous run, then spawns the workers and
    /// the lease sweeper. They stop when `shutdown` (or the returned handle)
    /// is cancelled.
    pub async fn start(&self, shutdown: CancellationToken) -> Result<PoolHandle, MindlogError> {
        let reclaimed = self.inner.reclaim().await?;
        if reclaimed > 0 {
            info!(count = reclaimed, "exhausted jobs from a previous run settled");
        }

        let cancel = shutdown.child_token();
        let mut tasks = JoinSet::new();
        for worker in 0..self.inner.settings.workers {
            tasks.spawn(worker_loop(self.inner.clone(), worker, cancel.clone()));
        }
        tasks.spawn(maintenance_loop(self.inner.clone(), cancel.clone()));

        info!(workers = self.inner.settings.workers, "analysis worker pool started");
        Ok(PoolHandle { cancel, tasks })
    }

    /// Claims and settles at most one due job. Returns whether one was found.
    pub async fn run_once(&self) -> Result<bool, MindlogError> {
        self.inner.run_once().await
    }

    /// Settles every job whose lease expired. Returns how many were exhausted.
    pub async fn reclaim(&self) -> Result<usize, MindlogError> {
        self.inner.reclaim().await
    }
}

/// Running pool tasks.
pub struct PoolHandle {
    cancel: CancellationToken,
    tasks: JoinSet<()>,
}

impl PoolHandle {
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stops taking new jobs and waits up to `grace` for jobs in flight.
    ///
    /// Tasks still running after `grace` are aborted; their jobs keep their
    /// lease and are reclaimed on the next start.
    pub async fn shutdown(mut self, grace: Duration) {
        self.cancel.cancel();
        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = self.tasks.join_next().await {
                if let Err(e) = joined {
                    if e.is_panic() {
                        error!(error = %e, "pool task panicked");
                    }
                }
            }
        })
        .await;

        match drained {
            Ok(()) => info!("analysis worker pool stopped"),
            Err(_) => {
                warn!(
                    remaining = self.tasks.len(),
                    "grace period elapsed, aborting pool tasks"
                );
                self.tasks.shutdown().await;
            }
        }
    }
}

async fn worker_loop(inner: Arc<PoolInner>, worker: usize, cancel: CancellationToken) {
    debug!(worker, "worker started");
    while !cancel.is_cancelled() {
        match inner.run_once().await {
            Ok(true) => continue,
            Ok(false) => {}
            Err(e) => warn!(worker, error = %e, "failed to claim job"),
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = inner.notify.notified() => {}
            _ = tokio::time::sleep(inner.settings.poll_interval) => {}
        }
    }
    debug!(worker, "worker stopped");
}

async fn maintenance_loop(inner: Arc<PoolInner>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(inner.settings.reclaim_interval) => {}
        }
        match inner.reclaim().await {
            Ok(0) => {}
            Ok(count) => info!(count, "expired leases settled"),
            Err(e) => warn!(error = %e, "lease sweep failed"),
        }
        // Requeued jobs are due now.
        inner.notify.notify_waiters();
    }
}

impl PoolInner {
    async fn run_once(&self) -> Result<bool, MindlogError> {
        let now = self.clock.now();
        let lease_until = after(now, self.settings.lease);
        let Some(job) = self.jobs.claim_next(now, lease_until).await? else {
            return Ok(false);
        };
        self.process(job).await;
        Ok(true)
    }

    async fn process(&self, job: AnalysisJob) {
        self.observers.emit(JobEvent::Started {
            job_id: job.id.clone(),
            attempt: job.attempt_count,
        });

        match self.analyzer.analyze(&job.entry_id).await {
            Ok(outcome) => {
                if outcome == EntryOutcome::Missing {
                    debug!(job = %job.id, entry = %job.entry_id, "entry gone, job closed");
                }
                let settled = self
                    .jobs
                    .mark_succeeded(&job.id, job.attempt_count, self.clock.now())
                    .await;
                match settled {
                    Ok(true) => self.observers.emit(JobEvent::Succeeded {
                        job_id: job.id,
                        attempt: job.attempt_count,
                    }),
                    Ok(false) => lease_lost(&job),
                    Err(e) => warn!(job = %job.id, error = %e, "failed to record success"),
                }
            }
            Err(e) if e.is_retryable() && job.attempts_remaining() => {
                let now = self.clock.now();
                let delay = backoff_delay(self.settings.backoff_base, job.attempt_count);
                let run_at = after(now, delay);
                let error = e.to_string();
                let settled = self
                    .jobs
                    .requeue(&job.id, job.attempt_count, run_at, &error, now)
                    .await;
                match settled {
                    Ok(true) => self.observers.emit(JobEvent::Retried {
                        job_id: job.id,
                        attempt: job.attempt_count,
                        delay,
                        error,
                    }),
                    Ok(false) => lease_lost(&job),
                    Err(e) => warn!(job = %job.id, error = %e, "failed to requeue job"),
                }
            }
            Err(e) => self.exhaust(job, e.to_string()).await,
        }
    }

    /// Terminates the job, then writes its fallback result.
    ///
    /// Nothing is written unless this attempt still holds the job.
    async fn exhaust(&self, job: AnalysisJob, error: String) {
        let settled = self
            .jobs
            .mark_failed(&job.id, job.attempt_count, &error, self.clock.now())
            .await;
        match settled {
            Ok(true) => {}
            Ok(false) => {
                lease_lost(&job);
                return;
            }
            Err(e) => {
                // The lease expires and the sweeper settles it.
                warn!(job = %job.id, error = %e, "failed to record terminal failure");
                return;
            }
        }
        if let Err(e) = self.analyzer.write_fallback(&job.entry_id).await {
            error!(job = %job.id, entry = %job.entry_id, error = %e, "failed to write fallback result");
        }
        self.observers.emit(JobEvent::Exhausted {
            job_id: job.id,
            attempts: job.attempt_count,
            error,
        });
    }

    async fn reclaim(&self) -> Result<usize, MindlogError> {
        let exhausted = self.jobs.reclaim_expired(self.clock.now()).await?;
        let count = exhausted.len();
        for job in exhausted {
            if let Err(e) = self.analyzer.write_fallback(&job.entry_id).await {
                error!(job = %job.id, entry = %job.entry_id, error = %e, "failed to write fallback for reclaimed job");
                continue;
            }
            let error = job
                .last_error
                .clone()
                .unwrap_or_else(|| "lease expired".to_string());
            self.observers.emit(JobEvent::Exhausted {
                job_id: job.id,
                attempts: job.attempt_count,
                error,
            });
        }
        Ok(count)
    }
}

fn lease_lost(job: &AnalysisJob) {
    warn!(job = %job.id, attempt = job.attempt_count, "lease was reclaimed, outcome discarded");
}

fn after(now: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|delay| now.checked_add_signed(delay))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
