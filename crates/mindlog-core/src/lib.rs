// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Mindlog analysis pipeline.
//!
//! This crate provides the error taxonomy, domain types, and collaborator
//! traits used throughout the Mindlog workspace. Storage backends, the
//! inference client, and test doubles all implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{InferenceFailure, MindlogError};
pub use types::{
    AnalysisJob, AnalysisResult, CacheEntry, ChatMessage, Completion, EntryId, FeatureKey,
    InferenceRequest, JobEvent, JobId, JobStatus, JournalEntry, Limit, Role, Tier, TierRule,
    Timeframe, UsageRecord, UserId, WindowKind,
};

pub use traits::{
    AnalysisStore, CacheStore, Clock, EntryStore, InferenceProvider, JobObserver, JobStore,
    PlanStore, SystemClock, UsageStore,
};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::{DateTime, Utc};

    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn tiers_are_ordered_by_plan() {
        assert!(Tier::Basic < Tier::Standard);
        assert!(Tier::Standard < Tier::Premium);
        assert!(Tier::Premium.has_plan(Tier::Standard));
        assert!(!Tier::Basic.has_plan(Tier::Standard));
    }

    #[test]
    fn tier_and_feature_parse_from_lowercase() {
        assert_eq!(Tier::from_str("premium").unwrap(), Tier::Premium);
        assert_eq!(FeatureKey::from_str("growth").unwrap(), FeatureKey::Growth);
        assert_eq!(Timeframe::from_str("all").unwrap(), Timeframe::All);
        assert_eq!(JobStatus::FailedTerminal.to_string(), "failed_terminal");
        assert!(Tier::from_str("gold").is_err());
    }

    #[test]
    fn timeframe_lower_bounds() {
        let now = at("2026-03-31T12:00:00Z");
        assert_eq!(Timeframe::Week.since(now), Some(at("2026-03-24T12:00:00Z")));
        // Month arithmetic clamps to the last day of the shorter month.
        assert_eq!(Timeframe::Month.since(now), Some(at("2026-02-28T12:00:00Z")));
        assert_eq!(Timeframe::Year.since(now), Some(at("2025-03-31T12:00:00Z")));
        assert_eq!(Timeframe::All.since(now), None);
    }

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::FailedTerminal.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn pending_result_is_unprocessed() {
        let pending = AnalysisResult::pending();
        assert!(!pending.processed);
        assert!(pending.identified_patterns.is_empty());
    }

    #[test]
    fn analysis_result_uses_camel_case_on_the_wire() {
        let result = AnalysisResult {
            supportive_text: "ok".into(),
            identified_patterns: vec!["p".into()],
            suggested_strategies: vec![],
            processed: true,
            fallback: false,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("supportiveText").is_some());
        assert!(json.get("identifiedPatterns").is_some());
    }

    #[test]
    fn all_collaborator_traits_are_object_safe() {
        fn _entry(_: &dyn EntryStore) {}
        fn _plan(_: &dyn PlanStore) {}
        fn _usage(_: &dyn UsageStore) {}
        fn _cache(_: &dyn CacheStore) {}
        fn _analysis(_: &dyn AnalysisStore) {}
        fn _jobs(_: &dyn JobStore) {}
        fn _inference(_: &dyn InferenceProvider) {}
        fn _observer(_: &dyn JobObserver) {}
        fn _clock(_: &dyn Clock) {}
    }
}
