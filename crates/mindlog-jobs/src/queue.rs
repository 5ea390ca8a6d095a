// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Producer side of the analysis queue.

use std::sync::Arc;

use mindlog_core::{
    AnalysisJob, AnalysisResult, AnalysisStore, Clock, EntryId, JobEvent, JobId, JobStore,
    MindlogError,
};
use tokio::sync::Notify;
use tracing::debug;

use crate::events::Observers;

/// Enqueues analysis jobs and answers status queries.
///
/// Take it from [`crate::WorkerPool::queue`] when the pool runs in the same
/// process so enqueues wake idle workers; otherwise workers find new jobs on
/// their next poll.
#[derive(Clone)]
pub struct JobQueue {
    pub(crate) jobs: Arc<dyn JobStore>,
    pub(crate) results: Arc<dyn AnalysisStore>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) notify: Arc<Notify>,
    pub(crate) observers: Observers,
    pub(crate) max_attempts: u32,
}

impl JobQueue {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        results: Arc<dyn AnalysisStore>,
        clock: Arc<dyn Clock>,
        max_attempts: u32,
    ) -> Self {
        Self {
            jobs,
            results,
            clock,
            notify: Arc::new(Notify::new()),
            observers: Observers::default(),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Flags the entry's result as pending and persists a job for it.
    ///
    /// Returns once the job is durable; analysis happens later.
    pub async fn enqueue_analysis(&self, entry: &EntryId) -> Result<JobId, MindlogError> {
        self.results.mark_pending(entry).await?;
        let job = self
            .jobs
            .enqueue(entry, self.max_attempts, self.clock.now())
            .await?;
        debug!(job = %job.id, entry = %entry, "analysis enqueued");

        self.observers.emit(JobEvent::Enqueued {
            job_id: job.id.clone(),
            entry_id: entry.clone(),
        });
        self.notify.notify_one();
        Ok(job.id)
    }

    /// The most recent job for an entry.
    pub async fn job_status(&self, entry: &EntryId) -> Result<Option<AnalysisJob>, MindlogError> {
        self.jobs.latest_for_entry(entry).await
    }

    /// The stored analysis, pending or final.
    pub async fn result(&self, entry: &EntryId) -> Result<Option<AnalysisResult>, MindlogError> {
        self.results.get_result(entry).await
    }
}
