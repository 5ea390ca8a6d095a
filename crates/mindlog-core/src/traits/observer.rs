// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observer interface for job lifecycle events.

use crate::types::JobEvent;

/// Receives every lifecycle event emitted by the worker pool.
///
/// Called inline on the worker task, so implementations must not block.
pub trait JobObserver: Send + Sync + 'static {
    fn on_event(&self, event: &JobEvent);
}
