// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed result schemas and the coercion from decoded model output.
//!
//! Model output is never trusted as-is. Each schema pulls its fields out of
//! the decoded JSON, coercing near misses (a scalar where a list belongs, a
//! number where text belongs, snake_case keys) and rejecting output that
//! carries none of the required fields.

use mindlog_core::{AnalysisResult, JournalEntry, MindlogError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::summarize::ReportVariant;

/// Mood score used when a record has none.
pub const DEFAULT_MOOD_SCORE: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodPoint {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// 1 to 10.
    pub score: u8,
}

impl MoodPoint {
    pub fn from_entry(entry: &JournalEntry) -> Self {
        Self {
            date: entry.date.format("%Y-%m-%d").to_string(),
            score: entry.mood_score.unwrap_or(DEFAULT_MOOD_SCORE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiteReport {
    pub progress: String,
    pub areas_to_improve: Vec<String>,
    pub next_step: String,
    pub mood_trend: Vec<MoodPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullReport {
    pub progress: String,
    pub areas_to_improve: Vec<String>,
    pub next_step: String,
    pub mood_trend: Vec<MoodPoint>,
    pub top_emotions: Vec<String>,
}

/// A growth report in the schema its tier asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum GrowthReport {
    Lite(LiteReport),
    Full(FullReport),
}

impl GrowthReport {
    /// Validates decoded output against `variant`'s schema.
    ///
    /// A missing or unusable `moodTrend` is synthesized from `entries`.
    pub fn from_value(
        value: Value,
        variant: ReportVariant,
        entries: &[JournalEntry],
    ) -> Result<Self, MindlogError> {
        let obj = object_of(value, "report")?;
        require_any(&obj, &[PROGRESS, AREAS, NEXT_STEP], "report")?;

        let progress = text(&obj, PROGRESS).unwrap_or_default();
        let areas_to_improve = list(&obj, AREAS).unwrap_or_default();
        let next_step = text(&obj, NEXT_STEP).unwrap_or_default();
        let mood_trend = mood_points(&obj)
            .filter(|points| !points.is_empty())
            .unwrap_or_else(|| synthesize_trend(entries));

        Ok(match variant {
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
                top_emotions: list(&obj, EMOTIONS).unwrap_or_default(),
            }),
        })
    }

    pub fn variant(&self) -> ReportVariant {
        match self {
            GrowthReport::Lite(_) => ReportVariant::Lite,
            GrowthReport::Full(_) => ReportVariant::Full,
        }
    }

    pub fn mood_trend(&self) -> &[MoodPoint] {
        match self {
            GrowthReport::Lite(r) => &r.mood_trend,
            GrowthReport::Full(r) => &r.mood_trend,
        }
    }

    pub fn progress(&self) -> &str {
        match self {
            GrowthReport::Lite(r) => &r.progress,
            GrowthReport::Full(r) => &r.progress,
        }
    }
}

/// One mood point per record, oldest first.
pub fn synthesize_trend(entries: &[JournalEntry]) -> Vec<MoodPoint> {
    entries.iter().map(MoodPoint::from_entry).collect()
}

/// Coerces decoded per-entry output into a processed [`AnalysisResult`].
///
/// The supportive reply is required; the lists default to empty.
pub fn entry_analysis_from_value(value: Value) -> Result<AnalysisResult, MindlogError> {
    let obj = object_of(value, "entry analysis")?;
    let supportive_text = text(&obj, SUPPORTIVE)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| MindlogError::Decode("entry analysis has no supportive response".into()))?;

    Ok(AnalysisResult {
        supportive_text,
        identified_patterns: list(&obj, PATTERNS).unwrap_or_default(),
        suggested_strategies: list(&obj, STRATEGIES).unwrap_or_default(),
        processed: true,
        fallback: false,
    })
}

/// Number of challenges a response must carry.
pub const CHALLENGE_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub title: String,
    pub description: String,
}

/// Extracts exactly [`CHALLENGE_COUNT`] challenges.
///
/// Accepts a bare array or an object wrapping one (`{"challenges": [...]}`).
/// Items missing a title or description are skipped; extras are dropped.
pub fn challenges_from_value(value: Value) -> Result<Vec<Challenge>, MindlogError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(obj) => {
            let wrapped = obj
                .get("challenges")
                .cloned()
                .or_else(|| obj.values().find(|v| v.is_array()).cloned());
            match wrapped {
                Some(Value::Array(items)) => items,
                _ => return Err(MindlogError::Decode("no challenge list in object".into())),
            }
        }
        _ => return Err(MindlogError::Decode("challenges are not a list".into())),
    };

    let challenges: Vec<Challenge> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(obj) => {
                let title = text(&obj, &["title", "name"])?;
                let description = text(&obj, &["description", "details", "text"])?;
                (!title.trim().is_empty() && !description.trim().is_empty())
                    .then_some(Challenge { title, description })
            }
            _ => None,
        })
        .take(CHALLENGE_COUNT)
        .collect();

    if challenges.len() < CHALLENGE_COUNT {
        return Err(MindlogError::Decode(format!(
            "expected {CHALLENGE_COUNT} challenges, got {}",
            challenges.len()
        )));
    }
    Ok(challenges)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub highlights: Vec<String>,
    pub patterns: Vec<String>,
    pub recommendations: Vec<String>,
}

impl MonthlyReport {
    pub fn from_value(value: Value) -> Result<Self, MindlogError> {
        let obj = object_of(value, "monthly report")?;
        require_any(&obj, &[HIGHLIGHTS, MONTHLY_PATTERNS, RECOMMENDATIONS], "monthly report")?;
        Ok(Self {
            highlights: list(&obj, HIGHLIGHTS).unwrap_or_default(),
            patterns: list(&obj, MONTHLY_PATTERNS).unwrap_or_default(),
            recommendations: list(&obj, RECOMMENDATIONS).unwrap_or_default(),
        })
    }
}

/// What tends to lower and lift the user's mood, with advice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionalPatterns {
    pub negative_triggers: Vec<String>,
    pub positive_triggers: Vec<String>,
    pub recommendations: Vec<String>,
}

impl EmotionalPatterns {
    /// Both trigger lists must be present; advice may be missing.
    pub fn from_value(value: Value) -> Result<Self, MindlogError> {
        let obj = object_of(value, "emotional patterns")?;
        let negative = list(&obj, NEGATIVE_TRIGGERS);
        let positive = list(&obj, POSITIVE_TRIGGERS);
        let (Some(negative_triggers), Some(positive_triggers)) = (negative, positive) else {
            return Err(MindlogError::Decode(
                "emotional patterns need both negative and positive triggers".into(),
            ));
        };
        Ok(Self {
            negative_triggers,
            positive_triggers,
            recommendations: list(&obj, RECOMMENDATIONS).unwrap_or_default(),
        })
    }
}

// Accepted spellings per field, preferred first.
const PROGRESS: &[&str] = &["progress"];
const AREAS: &[&str] = &["areasToImprove", "areas_to_improve", "areas"];
const NEXT_STEP: &[&str] = &["nextStep", "next_step"];
const MOOD_TREND: &[&str] = &["moodTrend", "mood_trend"];
const EMOTIONS: &[&str] = &["topEmotions", "top_emotions", "emotions"];
const SUPPORTIVE: &[&str] = &["supportiveResponse", "supportive_response", "supportiveText"];
const PATTERNS: &[&str] = &["identifiedPatterns", "identified_patterns", "patterns"];
const STRATEGIES: &[&str] = &["suggestedStrategies", "suggested_strategies", "strategies"];
const HIGHLIGHTS: &[&str] = &["highlights", "keyMoments", "key_moments"];
const MONTHLY_PATTERNS: &[&str] = &["patterns", "emotionalPatterns", "emotional_patterns"];
const RECOMMENDATIONS: &[&str] = &["recommendations", "advice"];
const NEGATIVE_TRIGGERS: &[&str] = &[
    "negativeTriggers",
    "negative_triggers",
    "negative",
    "worsens",
];
const POSITIVE_TRIGGERS: &[&str] = &[
    "positiveTriggers",
    "positive_triggers",
    "positive",
    "improves",
];

/// The top-level object, unwrapping a single-element array.
fn object_of(value: Value, what: &str) -> Result<Map<String, Value>, MindlogError> {
    match value {
        Value::Object(obj) => Ok(obj),
        Value::Array(mut items) if items.len() == 1 => match items.pop() {
            Some(Value::Object(obj)) => Ok(obj),
            _ => Err(MindlogError::Decode(format!("{what} is not an object"))),
        },
        _ => Err(MindlogError::Decode(format!("{what} is not an object"))),
    }
}

fn require_any(
    obj: &Map<String, Value>,
    fields: &[&[&str]],
    what: &str,
) -> Result<(), MindlogError> {
    if fields.iter().any(|names| field(obj, names).is_some()) {
        Ok(())
    } else {
        Err(MindlogError::Decode(format!("{what} has none of its required fields")))
    }
}

fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|name| obj.get(*name))
        .filter(|v| !v.is_null())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text(obj: &Map<String, Value>, names: &[&str]) -> Option<String> {
    match field(obj, names)? {
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar_text).collect();
            (!parts.is_empty()).then(|| parts.join(" "))
        }
        other => scalar_text(other),
    }
}

fn list(obj: &Map<String, Value>, names: &[&str]) -> Option<Vec<String>> {
    match field(obj, names)? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(scalar_text)
                .filter(|s| !s.is_empty())
                .collect(),
        ),
        other => scalar_text(other).map(|s| vec![s]),
    }
}

fn mood_points(obj: &Map<String, Value>) -> Option<Vec<MoodPoint>> {
    let Value::Array(items) = field(obj, MOOD_TREND)? else {
        return None;
    };
    Some(
        items
            .iter()
            .filter_map(|item| {
                let point = item.as_object()?;
                let date = point.get("date").and_then(scalar_text)?;
                let score = point
                    .get("score")
                    .and_then(mood_score)
                    .unwrap_or(DEFAULT_MOOD_SCORE);
                Some(MoodPoint { date, score })
            })
            .collect(),
    )
}

fn mood_score(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    // Clamped to 1..=10 so the cast cannot truncate.
    Some(raw.round().clamp(1.0, 10.0) as u8)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use mindlog_core::{EntryId, UserId};
    use serde_json::json;

    use super::*;

    fn entries() -> Vec<JournalEntry> {
        let base = DateTime::parse_from_rfc3339("2026-03-07T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        [Some(7), None, Some(3)]
            .into_iter()
            .enumerate()
            .map(|(i, mood)| JournalEntry {
                id: EntryId(format!("e{i}")),
                user_id: UserId("u1".into()),
                date: base + Duration::days(i as i64),
                content: "text".into(),
                mood_score: mood,
            })
            .collect()
    }

    #[test]
    fn lite_report_with_missing_trend_is_synthesized() {
        let value = json!({
            "progress": "Sleeping better.",
            "areasToImprove": ["exercise", "screen time"],
            "nextStep": "Walk after lunch."
        });
        let report = GrowthReport::from_value(value, ReportVariant::Lite, &entries()).unwrap();
        assert_eq!(report.variant(), ReportVariant::Lite);
        assert_eq!(
            report.mood_trend(),
            &[
                MoodPoint { date: "2026-03-07".into(), score: 7 },
                MoodPoint { date: "2026-03-08".into(), score: 5 },
                MoodPoint { date: "2026-03-09".into(), score: 3 },
            ]
        );
    }

    #[test]
    fn full_report_keeps_model_trend_and_emotions() {
        let value = json!({
            "progress": "Good month.",
            "areasToImprove": "rest",
            "nextStep": ["Call", "a friend"],
            "moodTrend": [{"date": "2026-03-01", "score": 6.6}, {"date": "2026-03-02", "score": "11"}, {"score": 4}],
            "topEmotions": ["joy", 3, {"x": 1}]
        });
        let GrowthReport::Full(report) =
            GrowthReport::from_value(value, ReportVariant::Full, &entries()).unwrap()
        else {
            panic!("expected full report");
        };
        assert_eq!(report.areas_to_improve, vec!["rest"]);
        assert_eq!(report.next_step, "Call a friend");
        assert_eq!(report.mood_trend.len(), 2);
        assert_eq!(report.mood_trend[0].score, 7);
        assert_eq!(report.mood_trend[1].score, 10);
        assert_eq!(report.top_emotions, vec!["joy", "3"]);
    }

    #[test]
    fn report_without_required_fields_is_rejected() {
        let err = GrowthReport::from_value(json!({"hello": "world"}), ReportVariant::Lite, &[])
            .unwrap_err();
        assert!(matches!(err, MindlogError::Decode(_)));
        assert!(GrowthReport::from_value(json!("text"), ReportVariant::Lite, &[]).is_err());
    }

    #[test]
    fn snake_case_keys_are_accepted() {
        let value = json!({"areas_to_improve": ["a"], "next_step": "b"});
        let report = GrowthReport::from_value(value, ReportVariant::Lite, &[]).unwrap();
        let GrowthReport::Lite(lite) = report else {
            panic!("expected lite report");
        };
        assert_eq!(lite.progress, "");
        assert_eq!(lite.next_step, "b");
    }

    #[test]
    fn report_variant_tag_is_serialized() {
        let report = GrowthReport::from_value(json!({"progress": "p"}), ReportVariant::Full, &[])
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["variant"], "full");
        assert!(json.get("topEmotions").is_some());
        let back: GrowthReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn entry_analysis_requires_supportive_text() {
        let result = entry_analysis_from_value(json!({
            "supportiveResponse": "That sounds hard.",
            "identifiedPatterns": "catastrophizing",
            "suggestedStrategies": ["breathe", "write it down"]
        }))
        .unwrap();
        assert!(result.processed);
        assert_eq!(result.identified_patterns, vec!["catastrophizing"]);
        assert_eq!(result.suggested_strategies.len(), 2);

        assert!(entry_analysis_from_value(json!({"identifiedPatterns": []})).is_err());
        assert!(entry_analysis_from_value(json!({"supportiveResponse": "  "})).is_err());
    }

    #[test]
    fn challenges_accept_array_or_wrapped_object() {
        let item = |t: &str| json!({"title": t, "description": "do it"});
        let bare = json!([item("a"), item("b"), item("c"), item("d")]);
        let parsed = challenges_from_value(bare).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[2].title, "c");

        let wrapped = json!({"challenges": [item("a"), {"title": "no description"}, item("b"), item("c")]});
        let parsed = challenges_from_value(wrapped).unwrap();
        assert_eq!(
            parsed.iter().map(|c| c.title.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn too_few_challenges_are_rejected() {
        let two = json!([
            {"title": "a", "description": "x"},
            {"title": "b", "description": "y"}
        ]);
        assert!(matches!(challenges_from_value(two), Err(MindlogError::Decode(_))));
        assert!(challenges_from_value(json!({"note": "none"})).is_err());
        assert!(challenges_from_value(json!(42)).is_err());
    }

    #[test]
    fn monthly_report_coerces_fields() {
        let report = MonthlyReport::from_value(json!({
            "highlights": "Started running",
            "patterns": ["Low on Mondays"]
        }))
        .unwrap();
        assert_eq!(report.highlights, vec!["Started running"]);
        assert!(report.recommendations.is_empty());
        assert!(MonthlyReport::from_value(json!({})).is_err());
    }

    #[test]
    fn emotional_patterns_need_both_trigger_lists() {
        let patterns = EmotionalPatterns::from_value(json!({
            "negative_triggers": ["late meetings", "skipped lunch"],
            "positiveTriggers": "morning runs",
            "advice": ["Keep lunch blocked"]
        }))
        .unwrap();
        assert_eq!(patterns.negative_triggers.len(), 2);
        assert_eq!(patterns.positive_triggers, vec!["morning runs"]);
        assert_eq!(patterns.recommendations, vec!["Keep lunch blocked"]);

        let one_sided = json!({"negativeTriggers": ["work"], "recommendations": ["rest"]});
        assert!(matches!(
            EmotionalPatterns::from_value(one_sided),
            Err(MindlogError::Decode(_))
        ));
    }
}
