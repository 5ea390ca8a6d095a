// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of storage, inference, reports, and the job pool.

use std::sync::Arc;

use mindlog_analysis::{EntryAnalyzer, ReportDeps, ReportService};
use mindlog_config::MindlogConfig;
use mindlog_core::{Clock, InferenceProvider, MindlogError, SystemClock};
use mindlog_inference::{AdmissionScheduler, client_from_config};
use mindlog_jobs::{JobQueue, PoolSettings, TracingObserver, WorkerPool};
use mindlog_storage::SqliteStorage;

/// Long-lived service objects shared by every command.
pub struct App {
    pub config: Arc<MindlogConfig>,
    pub storage: Arc<SqliteStorage>,
    pub clock: Arc<dyn Clock>,
}

/// The inference provider and the scheduler it dispatches through.
pub struct Inference {
    pub scheduler: Arc<AdmissionScheduler>,
    pub provider: Arc<dyn InferenceProvider>,
}

impl App {
    pub async fn open(config: MindlogConfig) -> Result<Self, MindlogError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let storage = SqliteStorage::open(&config.storage)
            .await?
            .with_clock(clock.clone());
        Ok(Self::new(config, Arc::new(storage), clock))
    }

    pub fn new(config: MindlogConfig, storage: Arc<SqliteStorage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            clock,
        }
    }

    /// Builds the HTTP client behind a fresh admission scheduler.
    ///
    /// Fails without an API key, so commands that never call the model
    /// do not go through here.
    pub fn connect_inference(&self) -> Result<Inference, MindlogError> {
        let scheduler = Arc::new(AdmissionScheduler::from_config(&self.config.limiter));
        let client = client_from_config(&self.config, scheduler.clone())?;
        Ok(Inference {
            scheduler,
            provider: Arc::new(client),
        })
    }

    /// Producer handle for processes that do not run workers.
    pub fn queue(&self) -> JobQueue {
        JobQueue::new(
            self.storage.clone(),
            self.storage.clone(),
            self.clock.clone(),
            self.config.jobs.max_attempts,
        )
    }

    pub fn reports(&self, inference: Arc<dyn InferenceProvider>) -> ReportService {
        ReportService::new(
            ReportDeps {
                entries: self.storage.clone(),
                plans: self.storage.clone(),
                usage: self.storage.clone(),
                cache: self.storage.clone(),
                inference,
                clock: self.clock.clone(),
            },
            self.config.clone(),
        )
    }

    pub fn worker_pool(&self, inference: Arc<dyn InferenceProvider>) -> WorkerPool {
        let analyzer = Arc::new(EntryAnalyzer::new(
            self.storage.clone(),
            self.storage.clone(),
            inference,
            self.config.clone(),
        ));
        WorkerPool::builder(
            self.storage.clone(),
            self.storage.clone(),
            analyzer,
            self.clock.clone(),
        )
        .with_settings(PoolSettings::from(&self.config.jobs))
        .with_observer(Arc::new(TracingObserver))
        .build()
    }
}
