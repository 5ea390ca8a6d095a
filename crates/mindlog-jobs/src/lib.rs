// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background analysis jobs for Mindlog.
//!
//! Entries are analysed off the request path: [`JobQueue`] persists one job
//! per entry and wakes the [`WorkerPool`], whose workers claim due jobs,
//! retry retryable failures with exponential backoff, and write the fallback
//! result once a job's attempts are exhausted. Leases held by workers that
//! vanished are reclaimed on start and periodically afterwards.

pub mod backoff;
pub mod events;
pub mod pool;
pub mod queue;
pub mod settings;

pub use backoff::backoff_delay;
pub use events::{EventChannel, TracingObserver};
pub use pool::{PoolHandle, WorkerPool, WorkerPoolBuilder};
pub use queue::JobQueue;
pub use settings::PoolSettings;
