// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Analysis pipeline for Mindlog.
//!
//! Everything between a journal entry and a stored, structured result:
//! sanitization, digests and prompts, the resilient decoder, typed result
//! schemas with fallbacks, the report cache, the per-entry analyzer run by
//! background jobs, and the [`ReportService`].

pub mod cache;
mod challenges;
pub mod decoder;
pub mod fallback;
mod monthly;
mod patterns;
pub mod pipeline;
pub mod prompts;
pub mod repair;
mod report;
pub mod sanitize;
pub mod schema;
pub mod service;
pub mod summarize;

pub use cache::ResultCache;
pub use decoder::{DecodeStage, Decoded, decode};
pub use pipeline::{EntryAnalyzer, EntryOutcome};
pub use schema::{
    Challenge, EmotionalPatterns, FullReport, GrowthReport, LiteReport, MonthlyReport, MoodPoint,
};
pub use service::{Generated, ReportDeps, ReportResponse, ReportService};
pub use summarize::{ReportVariant, TierLimits, summarize};
