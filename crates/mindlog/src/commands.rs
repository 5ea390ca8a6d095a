// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot CLI commands. Results are printed to stdout as JSON.

use std::io::Write;
use std::sync::Arc;

use chrono::Duration;
use mindlog_config::MindlogConfig;
use mindlog_config::model::FeatureQuota;
use mindlog_core::{
    AnalysisJob, AnalysisResult, EntryId, EntryStore, InferenceProvider, JobId, JournalEntry,
    MindlogError, Tier, UserId,
};
use serde::Serialize;
use tracing::info;

use crate::app::App;

/// Paid plans created from the CLI default to this many days.
const DEFAULT_PLAN_DAYS: i64 = 30;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryAdded {
    pub entry_id: EntryId,
    /// `None` when analysis was skipped.
    pub job_id: Option<JobId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryStatus {
    pub entry_id: EntryId,
    pub job: Option<AnalysisJob>,
    /// Absent until analysis was first requested; `processed = false` while pending.
    pub result: Option<AnalysisResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrainSummary {
    pub processed: usize,
    pub reclaimed: usize,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), MindlogError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| MindlogError::Internal(format!("failed to render output: {e}")))?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{text}").map_err(|e| MindlogError::Internal(format!("failed to write output: {e}")))
}

/// Creates or updates a user's plan.
pub async fn set_user(
    app: &App,
    user: &UserId,
    tier: Tier,
    expires_in_days: Option<i64>,
) -> Result<(), MindlogError> {
    let expires = (tier > Tier::Basic)
        .then(|| app.clock.now() + Duration::days(expires_in_days.unwrap_or(DEFAULT_PLAN_DAYS)));
    app.storage.upsert_user(user, tier, expires).await?;
    info!(user = %user, %tier, expires = ?expires, "plan updated");
    Ok(())
}

/// Stores a new entry dated now and, unless told otherwise, queues its analysis.
pub async fn add_entry(
    app: &App,
    user: &UserId,
    content: &str,
    mood_score: Option<u8>,
    analyze: bool,
) -> Result<EntryAdded, MindlogError> {
    if content.trim().is_empty() {
        return Err(MindlogError::Validation("entry content is empty".into()));
    }
    if let Some(score) = mood_score {
        if !(1..=10).contains(&score) {
            return Err(MindlogError::Validation(format!(
                "mood score {score} is outside 1..=10"
            )));
        }
    }

    let entry = JournalEntry {
        id: EntryId(uuid::Uuid::new_v4().to_string()),
        user_id: user.clone(),
        date: app.clock.now(),
        content: content.to_string(),
        mood_score,
    };
    app.storage.upsert_entry(&entry).await?;

    let job_id = if analyze {
        Some(app.queue().enqueue_analysis(&entry.id).await?)
    } else {
        None
    };
    Ok(EntryAdded {
        entry_id: entry.id,
        job_id,
    })
}

/// Queues (re-)analysis of an existing entry.
pub async fn enqueue(app: &App, entry: &EntryId) -> Result<JobId, MindlogError> {
    if app.storage.get_entry(entry).await?.is_none() {
        return Err(MindlogError::Validation(format!("entry {entry} does not exist")));
    }
    app.queue().enqueue_analysis(entry).await
}

pub async fn entry_status(app: &App, entry: &EntryId) -> Result<EntryStatus, MindlogError> {
    let queue = app.queue();
    Ok(EntryStatus {
        entry_id: entry.clone(),
        job: queue.job_status(entry).await?,
        result: queue.result(entry).await?,
    })
}

/// Settles expired leases, then runs due jobs inline until none are left.
pub async fn drain_jobs(
    app: &App,
    inference: Arc<dyn InferenceProvider>,
) -> Result<DrainSummary, MindlogError> {
    let pool = app.worker_pool(inference);
    let reclaimed = pool.reclaim().await?;
    let mut processed = 0;
    while pool.run_once().await? {
        processed += 1;
    }
    Ok(DrainSummary {
        processed,
        reclaimed,
    })
}

/// Human-readable summary for `mindlog config check`.
pub fn describe_config(config: &MindlogConfig) -> String {
    let quota = &config.quota;
    let describe = |rule: &FeatureQuota| {
        let premium = rule
            .premium_count
            .map_or_else(|| "unlimited".to_string(), |n| n.to_string());
        format!(
            "{} {} (premium: {premium})",
            rule.standard_count, rule.window
        )
    };
    [
        "configuration is valid".to_string(),
        format!("  database:   {}", config.storage.database_path),
        format!("  endpoint:   {}", config.inference.base_url),
        format!("  model:      {}", config.inference.model),
        format!(
            "  workers:    {} (max {} attempts)",
            config.jobs.workers, config.jobs.max_attempts
        ),
        format!("  growth:     {}", describe(&quota.growth)),
        format!("  challenges: {}", describe(&quota.challenges)),
        format!("  monthly:    {}", describe(&quota.monthly)),
        format!("  charge on fallback: {}", quota.charge_on_fallback),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use mindlog_test_utils::TestHarness;

    use super::*;

    fn app(harness: &TestHarness) -> App {
        App::new(
            harness.config.clone(),
            harness.storage.clone(),
            harness.clock.clone(),
        )
    }

    #[tokio::test]
    async fn added_entry_is_pending_analysis() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = app(&harness);
        let user = UserId("u1".into());

        let added = add_entry(&app, &user, "Slept badly again.", Some(3), true)
            .await
            .unwrap();
        assert!(added.job_id.is_some());

        let status = entry_status(&app, &added.entry_id).await.unwrap();
        assert!(!status.result.unwrap().processed);
        assert_eq!(status.job.unwrap().attempt_count, 0);

        let stored = harness.storage.get_entry(&added.entry_id).await.unwrap().unwrap();
        assert_eq!(stored.date, harness.now());
        assert_eq!(stored.mood_score, Some(3));
    }

    #[tokio::test]
    async fn skipping_analysis_leaves_no_job() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = app(&harness);
        let added = add_entry(&app, &UserId("u1".into()), "text", None, false)
            .await
            .unwrap();
        assert!(added.job_id.is_none());
        let status = entry_status(&app, &added.entry_id).await.unwrap();
        assert!(status.job.is_none() && status.result.is_none());
    }

    #[tokio::test]
    async fn entry_input_is_validated() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = app(&harness);
        let user = UserId("u1".into());
        assert!(matches!(
            add_entry(&app, &user, "   ", None, true).await,
            Err(MindlogError::Validation(_))
        ));
        assert!(matches!(
            add_entry(&app, &user, "text", Some(11), true).await,
            Err(MindlogError::Validation(_))
        ));
        assert!(matches!(
            enqueue(&app, &EntryId("nope".into())).await,
            Err(MindlogError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn paid_plans_get_an_expiry() {
        use mindlog_core::PlanStore;

        let harness = TestHarness::builder().build().await.unwrap();
        let app = app(&harness);
        let user = UserId("u1".into());
        set_user(&app, &user, Tier::Premium, Some(2)).await.unwrap();
        assert_eq!(harness.storage.get_tier(&user).await.unwrap(), Tier::Premium);

        harness.clock.advance(Duration::days(3));
        assert_eq!(harness.storage.get_tier(&user).await.unwrap(), Tier::Basic);
    }

    #[tokio::test]
    async fn drain_runs_every_due_job() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness
            .inference
            .set_default(r#"{"supportiveResponse": "ok", "identifiedPatterns": [], "suggestedStrategies": []}"#)
            .await;
        let app = app(&harness);
        let user = UserId("u1".into());
        for text in ["one", "two", "three"] {
            add_entry(&app, &user, text, None, true).await.unwrap();
        }

        let summary = drain_jobs(&app, harness.inference.clone()).await.unwrap();
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.reclaimed, 0);
        let counts = harness.storage.job_counts().await.unwrap();
        assert_eq!(counts.get("succeeded"), Some(&3));
    }

    #[test]
    fn config_summary_names_quota_rules() {
        let summary = describe_config(&MindlogConfig::default());
        assert!(summary.contains("growth:     1 daily (premium: unlimited)"));
        assert!(summary.contains("challenges: 3 daily"));
        assert!(summary.contains("monthly:    2 monthly"));
    }
}
