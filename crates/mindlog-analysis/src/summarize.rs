// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded digests of recent entries for report prompts.

use mindlog_config::model::AnalysisConfig;
use mindlog_core::{JournalEntry, Tier, Timeframe};

use crate::sanitize::{sanitize_entry, truncate_chars};

/// Which report schema a prompt asks for. Chosen by tier, never by output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportVariant {
    /// progress, areasToImprove, nextStep, moodTrend.
    Lite,
    /// Lite plus topEmotions.
    Full,
}

impl ReportVariant {
    pub fn for_tier(tier: Tier) -> Self {
        if tier.has_plan(Tier::Premium) {
            ReportVariant::Full
        } else {
            ReportVariant::Lite
        }
    }
}

/// Size limits for one report request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierLimits {
    pub variant: ReportVariant,
    /// Records required before a report is attempted.
    pub min_records: usize,
    /// Most recent records included in the digest.
    pub max_entries: usize,
    /// Characters of each record body kept in the digest.
    pub entry_chars: usize,
    pub max_tokens: u32,
}

impl TierLimits {
    pub fn resolve(config: &AnalysisConfig, tier: Tier, timeframe: Timeframe) -> Self {
        let variant = ReportVariant::for_tier(tier);
        match variant {
            ReportVariant::Full => Self {
                variant,
                min_records: config.premium_min_records,
                max_entries: config.premium_summary_limits.get(timeframe),
                entry_chars: config.digest_entry_chars,
                max_tokens: config.premium_token_limits.get(timeframe),
            },
            ReportVariant::Lite => Self {
                variant,
                min_records: config.standard_min_records,
                max_entries: config.standard_summary_limit,
                entry_chars: config.digest_entry_chars,
                max_tokens: config.standard_token_limit,
            },
        }
    }
}

/// Renders the `max_entries` most recent records, oldest first, one bullet each.
///
/// `entries` must already be sorted oldest first.
pub fn summarize(entries: &[JournalEntry], limits: &TierLimits) -> String {
    digest(entries, limits.max_entries, limits.entry_chars)
}

/// Digest of the last `max_entries` records with bodies cut to `entry_chars`.
pub fn digest(entries: &[JournalEntry], max_entries: usize, entry_chars: usize) -> String {
    let start = entries.len().saturating_sub(max_entries);
    entries[start..]
        .iter()
        .map(|entry| digest_line(entry, entry_chars))
        .collect::<Vec<_>>()
        .join("\n")
}

fn digest_line(entry: &JournalEntry, entry_chars: usize) -> String {
    let clean = sanitize_entry(&entry.content);
    let body = truncate_chars(&clean, entry_chars);
    let ellipsis = if body.len() < clean.len() { "…" } else { "" };
    let score = entry
        .mood_score
        .map_or_else(|| "n/a".to_string(), |s| s.to_string());
    format!(
        "• {} (score {score}) — {body}{ellipsis}",
        entry.date.format("%Y-%m-%d")
    )
}
