// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits at the seams of the analysis pipeline.
//!
//! Stores and the inference provider use `#[async_trait]` so they can be
//! held as `Arc<dyn Trait>` and swapped for in-memory or mock versions.

pub mod clock;
pub mod inference;
pub mod observer;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use inference::InferenceProvider;
pub use observer::JobObserver;
pub use store::{AnalysisStore, CacheStore, EntryStore, JobStore, PlanStore, UsageStore};
