// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synchronous, quota-gated report generation.
//!
//! [`ReportService`] owns the quota ledger and the result cache and exposes
//! the growth report, challenge, monthly report, and emotional pattern
//! operations. Each lives in its own module as an `impl ReportService` block.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mindlog_config::MindlogConfig;
use mindlog_core::{
    CacheStore, ChatMessage, Clock, EntryStore, FeatureKey, InferenceProvider, InferenceRequest,
    MindlogError, PlanStore, Tier, UsageStore, UserId,
};
use mindlog_quota::{QuotaDecision, QuotaLedger};
use serde::Serialize;
use tracing::info;

use crate::cache::ResultCache;

/// Growth report answer, cached or freshly generated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse<T> {
    pub data: T,
    pub cached: bool,
    pub generated_at: DateTime<Utc>,
    /// When a capped tier may next get a fresh report; `None` when uncapped.
    pub next_allowed_at: Option<DateTime<Utc>>,
    /// The data is the pre-authored fallback, not model output.
    pub fallback: bool,
}

/// Answer of an uncached generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Generated<T> {
    pub data: T,
    pub generated_at: DateTime<Utc>,
    pub fallback: bool,
}

/// Collaborators of a [`ReportService`].
pub struct ReportDeps {
    pub entries: Arc<dyn EntryStore>,
    pub plans: Arc<dyn PlanStore>,
    pub usage: Arc<dyn UsageStore>,
    pub cache: Arc<dyn CacheStore>,
    pub inference: Arc<dyn InferenceProvider>,
    pub clock: Arc<dyn Clock>,
}

pub struct ReportService {
    pub(crate) entries: Arc<dyn EntryStore>,
    pub(crate) plans: Arc<dyn PlanStore>,
    pub(crate) inference: Arc<dyn InferenceProvider>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) quota: QuotaLedger,
    pub(crate) cache: ResultCache,
    pub(crate) config: Arc<MindlogConfig>,
}

impl ReportService {
    pub fn new(deps: ReportDeps, config: Arc<MindlogConfig>) -> Self {
        let quota = QuotaLedger::new(deps.usage, config.quota.clone(), deps.clock.clone());
        let cache = ResultCache::new(deps.cache, config.cache.clone(), deps.clock.clone());
        Self {
            entries: deps.entries,
            plans: deps.plans,
            inference: deps.inference,
            clock: deps.clock,
            quota,
            cache,
            config,
        }
    }

    pub fn quota(&self) -> &QuotaLedger {
        &self.quota
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Read-only quota state of `feature` for `user`.
    pub async fn usage(
        &self,
        user: &UserId,
        feature: FeatureKey,
    ) -> Result<QuotaDecision, MindlogError> {
        let tier = self.plans.get_tier(user).await?;
        self.quota.check(user, feature, tier).await
    }

    /// Rejects unavailable features and exhausted quotas before any work.
    pub(crate) async fn preflight(
        &self,
        user: &UserId,
        feature: FeatureKey,
        tier: Tier,
    ) -> Result<QuotaDecision, MindlogError> {
        match self.quota.check(user, feature, tier).await? {
            QuotaDecision::Unavailable => {
                info!(user = %user, %feature, %tier, "feature not offered on tier");
                Err(MindlogError::FeatureUnavailable { feature, tier })
            }
            decision => Ok(decision),
        }
    }

    pub(crate) fn request(
        &self,
        messages: Vec<ChatMessage>,
        tier: Tier,
        max_tokens: u32,
        json_object: bool,
    ) -> InferenceRequest {
        InferenceRequest {
            messages,
            model: self.config.inference.model_for(tier).to_string(),
            temperature: self.config.analysis.report_temperature,
            max_tokens,
            timeout: Duration::from_secs(self.config.inference.timeout_secs),
            json_object,
        }
    }
}

/// `Err(QuotaExceeded)` for a denied decision.
pub(crate) fn ensure_allowed(
    decision: &QuotaDecision,
    feature: FeatureKey,
) -> Result<(), MindlogError> {
    match decision {
        QuotaDecision::Denied { next_allowed_at } => Err(MindlogError::QuotaExceeded {
            feature,
            next_allowed_at: *next_allowed_at,
        }),
        _ => Ok(()),
    }
}
