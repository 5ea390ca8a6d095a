// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pre-authored results used when generation fails irrecoverably.

use mindlog_core::{AnalysisResult, JournalEntry};

use crate::schema::{
    Challenge, EmotionalPatterns, FullReport, GrowthReport, LiteReport, MonthlyReport,
    synthesize_trend,
};
use crate::summarize::ReportVariant;

/// Written for an entry whose analysis job exhausted its attempts.
pub fn entry_result() -> AnalysisResult {
    AnalysisResult {
        supportive_text: "Thank you for sharing your thoughts. I'm here to support you.".into(),
        identified_patterns: vec!["Could not analyze the entry".into()],
        suggested_strategies: vec!["Try coming back later and rephrasing your thoughts.".into()],
        processed: true,
        fallback: true,
    }
}

pub fn challenges() -> Vec<Challenge> {
    [
        (
            "10-minute meditation",
            "Spend 10 minutes on mindful breathing every day.",
        ),
        (
            "Gratitude journal",
            "Write down three things you are grateful for today.",
        ),
        ("Offline walk", "Walk for 30 minutes without your phone or headphones."),
    ]
    .into_iter()
    .map(|(title, description)| Challenge {
        title: title.into(),
        description: description.into(),
    })
    .collect()
}

/// A neutral report built only from the records themselves.
pub fn growth_report(variant: ReportVariant, entries: &[JournalEntry]) -> GrowthReport {
    let progress = format!(
        "You wrote {} entries in this period. Keep writing to see how things change.",
        entries.len()
    );
    let areas_to_improve = vec!["Write a little every day, even on quiet days.".to_string()];
    let next_step = "Tomorrow, note one thing that went well and why.".to_string();
    let mood_trend = synthesize_trend(entries);

    match variant {
        ReportVariant::Lite => GrowthReport::Lite(LiteReport {
            progress,
            areas_to_improve,
            next_step,
            mood_trend,
        }),
        ReportVariant::Full => GrowthReport::Full(FullReport {
            progress,
            areas_to_improve,
            next_step,
            mood_trend,
            top_emotions: Vec::new(),
        }),
    }
}

pub fn monthly_report(entries: &[JournalEntry]) -> MonthlyReport {
    MonthlyReport {
        highlights: vec![format!(
            "You wrote {} entries over the last 30 days.",
            entries.len()
        )],
        patterns: vec!["There is not enough information to describe patterns right now.".into()],
        recommendations: vec![
            "Keep journaling regularly and note your mood with each entry.".into(),
            "Try again later for a detailed report.".into(),
        ],
    }
}

pub fn emotional_patterns() -> EmotionalPatterns {
    EmotionalPatterns {
        negative_triggers: vec!["Not enough detail to name what lowers your mood yet.".into()],
        positive_triggers: vec!["Not enough detail to name what lifts your mood yet.".into()],
        recommendations: vec![
            "Note what happened just before a low or a good moment.".into(),
            "Try again after a few more entries.".into(),
        ],
    }
}
