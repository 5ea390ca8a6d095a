// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the storage, inference, quota, analysis, and job crates.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Unique identifier for a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

/// Unique identifier for an analysis job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Subscription level. Declaration order is the plan order: basic < standard < premium.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tier {
    Basic,
    Standard,
    Premium,
}

impl Tier {
    /// Whether this tier is at least `required`.
    pub fn has_plan(self, required: Tier) -> bool {
        self >= required
    }
}

/// A quota-gated, inference-backed feature.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FeatureKey {
    /// Periodic growth report over a timeframe.
    Growth,
    /// Three personalised challenges.
    Challenges,
    /// Deep report over the last 30 days.
    Monthly,
}

/// Report period. The lowercase name doubles as the cache key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Timeframe {
    Week,
    Month,
    Year,
    All,
}

impl Timeframe {
    /// Earliest record date included in a report generated at `now`.
    /// `None` means no lower bound.
    pub fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Timeframe::Week => Some(now - chrono::Duration::days(7)),
            Timeframe::Month => now.checked_sub_months(Months::new(1)),
            Timeframe::Year => now.checked_sub_months(Months::new(12)),
            Timeframe::All => None,
        }
    }

    /// Cache key for this timeframe.
    pub fn cache_key(self) -> String {
        self.to_string()
    }
}

/// How a feature's usage window is delimited.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WindowKind {
    /// One UTC calendar day.
    Daily,
    /// One UTC calendar month.
    Monthly,
}

/// Allowance granted by a tier rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// The feature is not offered at all.
    Disabled,
    /// At most this many realized attempts per window.
    Capped(u32),
    Unlimited,
}

/// Static usage rule for one (feature, tier) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierRule {
    pub tier: Tier,
    pub window: WindowKind,
    pub limit: Limit,
}

/// A dated text record authored by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EntryId,
    pub user_id: UserId,
    pub date: DateTime<Utc>,
    pub content: String,
    /// Self-reported mood, 1 to 10.
    pub mood_score: Option<u8>,
}

/// Lifecycle state of an [`AnalysisJob`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    FailedTerminal,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::FailedTerminal)
    }
}

/// A durable request to analyse one journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisJob {
    pub id: JobId,
    pub entry_id: EntryId,
    pub enqueued_at: DateTime<Utc>,
    /// Attempts started so far, never above `max_attempts`.
    pub attempt_count: u32,
    pub max_attempts: u32,
    pub status: JobStatus,
    /// Earliest time the job may be claimed again.
    pub run_at: DateTime<Utc>,
    pub last_error: Option<String>,
}

impl AnalysisJob {
    pub fn attempts_remaining(&self) -> bool {
        self.attempt_count < self.max_attempts
    }
}

/// Structured per-entry analysis. `processed` is false until a worker writes a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub supportive_text: String,
    pub identified_patterns: Vec<String>,
    pub suggested_strategies: Vec<String>,
    pub processed: bool,
    /// Set when the result is the canned fallback rather than model output.
    #[serde(default)]
    pub fallback: bool,
}

impl AnalysisResult {
    /// Placeholder readers see while analysis is still outstanding.
    pub fn pending() -> Self {
        Self {
            supportive_text: String::new(),
            identified_patterns: Vec::new(),
            suggested_strategies: Vec::new(),
            processed: false,
            fallback: false,
        }
    }
}

/// Usage counter for one (user, feature, window).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub user_id: UserId,
    pub feature: FeatureKey,
    pub window_key: String,
    pub count: u32,
}

/// Previously generated report for one (user, timeframe key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub user_id: UserId,
    pub timeframe_key: String,
    pub data: serde_json::Value,
    pub generated_at: DateTime<Utc>,
}

/// Speaker of a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A single completion call. Built per call and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    /// Ask the endpoint for a JSON object response.
    pub json_object: bool,
}

/// Text returned by the endpoint for a completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
}

/// Lifecycle notification emitted by the worker pool.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Enqueued {
        job_id: JobId,
        entry_id: EntryId,
    },
    Started {
        job_id: JobId,
        attempt: u32,
    },
    Succeeded {
        job_id: JobId,
        attempt: u32,
    },
    Retried {
        job_id: JobId,
        attempt: u32,
        delay: Duration,
        error: String,
    },
    Exhausted {
        job_id: JobId,
        attempts: u32,
        error: String,
    },
}

impl JobEvent {
    pub fn job_id(&self) -> &JobId {
        match self {
            JobEvent::Enqueued { job_id, .. }
            | JobEvent::Started { job_id, .. }
            | JobEvent::Succeeded { job_id, .. }
            | JobEvent::Retried { job_id, .. }
            | JobEvent::Exhausted { job_id, .. } => job_id,
        }
    }
}
