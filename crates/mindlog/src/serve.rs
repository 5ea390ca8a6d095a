// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mindlog serve`: run the analysis worker pool until shutdown.

use std::time::Duration;

use mindlog_core::MindlogError;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::app::{App, Inference};

/// Time in-flight jobs get to finish once shutdown starts.
const DRAIN_GRACE: Duration = Duration::from_secs(30);

pub async fn run_serve(
    app: &App,
    inference: Inference,
    shutdown: CancellationToken,
) -> Result<(), MindlogError> {
    let pool = app.worker_pool(inference.provider.clone());
    let handle = pool.start(shutdown.clone()).await?;

    info!(
        database = %app.config.storage.database_path,
        workers = pool.settings().workers,
        "mindlog serving; waiting for jobs"
    );
    shutdown.cancelled().await;

    info!("draining worker pool");
    handle.shutdown(DRAIN_GRACE).await;
    inference.scheduler.shutdown();
    app.storage.close().await?;
    info!("mindlog stopped");
    Ok(())
}
