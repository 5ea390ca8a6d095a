// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Growth reports over a timeframe.

use mindlog_core::{FeatureKey, Limit, MindlogError, Tier, Timeframe, UserId};
use mindlog_quota::QuotaDecision;
use tracing::{info, warn};

use crate::decoder::decode;
use crate::fallback;
use crate::prompts::report_messages;
use crate::schema::GrowthReport;
use crate::service::{ReportResponse, ReportService, ensure_allowed};
use crate::summarize::{TierLimits, summarize};

impl ReportService {
    /// Returns a growth report for `timeframe`, from cache when fresh.
    ///
    /// Order of gates: tier availability, fresh cache hit (served even with
    /// the quota spent), quota, minimum record count. Only then is a use
    /// reserved and the model called. An inference failure releases the use
    /// and surfaces; unusable model output yields an uncached fallback.
    pub async fn generate_report(
        &self,
        user: &UserId,
        timeframe: Timeframe,
        force: bool,
    ) -> Result<ReportResponse<GrowthReport>, MindlogError> {
        let feature = FeatureKey::Growth;
        let tier = self.plans.get_tier(user).await?;
        let decision = self.preflight(user, feature, tier).await?;
        if !self.timeframe_offered(tier, timeframe) {
            info!(user = %user, %tier, %timeframe, "timeframe not offered on tier");
            return Err(MindlogError::FeatureUnavailable { feature, tier });
        }
        let capped = matches!(self.quota.rule(feature, tier).limit, Limit::Capped(_));
        let key = timeframe.cache_key();

        if let Some(hit) = self.cache.lookup(user, &key, tier, force).await? {
            match serde_json::from_value::<GrowthReport>(hit.data) {
                Ok(data) => {
                    info!(user = %user, %timeframe, generated_at = %hit.generated_at, "serving cached report");
                    return Ok(ReportResponse {
                        data,
                        cached: true,
                        generated_at: hit.generated_at,
                        next_allowed_at: capped
                            .then(|| self.cache.expires_at(hit.generated_at, tier)),
                        fallback: false,
                    });
                }
                Err(e) => {
                    warn!(user = %user, %timeframe, error = %e, "cached report unreadable, regenerating");
                }
            }
        }
        ensure_allowed(&decision, feature)?;

        let entries = self
            .entries
            .find_by_user_since(user, timeframe.since(self.clock.now()))
            .await?;
        let limits = TierLimits::resolve(&self.config.analysis, tier, timeframe);
        if entries.len() < limits.min_records {
            return Err(MindlogError::Validation(format!(
                "at least {} entries are needed for a {timeframe} report, found {}",
                limits.min_records,
                entries.len()
            )));
        }

        let reservation = self.quota.check_and_reserve(user, feature, tier).await?;
        let digest = summarize(&entries, &limits);
        let request = self.request(
            report_messages(limits.variant, &digest),
            tier,
            limits.max_tokens,
            true,
        );

        let completion = match self.inference.complete(request).await {
            Ok(completion) => completion,
            Err(e) => {
                warn!(user = %user, %timeframe, error = %e, "report generation failed");
                reservation.release().await.ok();
                return Err(e);
            }
        };

        let parsed = decode(&completion.content)
            .and_then(|decoded| GrowthReport::from_value(decoded.value, limits.variant, &entries));
        let report = match parsed {
            Ok(report) => report,
            Err(e) => {
                warn!(user = %user, %timeframe, error = %e, "report output unusable, returning fallback");
                self.quota.settle_fallback(reservation).await?;
                return Ok(ReportResponse {
                    data: fallback::growth_report(limits.variant, &entries),
                    cached: false,
                    generated_at: self.clock.now(),
                    next_allowed_at: self.denied_until(user, feature, tier).await?,
                    fallback: true,
                });
            }
        };

        let data = match serde_json::to_value(&report) {
            Ok(data) => data,
            Err(e) => {
                reservation.release().await.ok();
                return Err(MindlogError::Internal(format!("report serialization failed: {e}")));
            }
        };
        let used = reservation.commit();
        let stored = self.cache.put(user, &key, data).await?;
        info!(user = %user, %timeframe, used, entries = entries.len(), "report generated");

        Ok(ReportResponse {
            data: report,
            cached: false,
            generated_at: stored.generated_at,
            next_allowed_at: capped.then(|| self.cache.expires_at(stored.generated_at, tier)),
            fallback: false,
        })
    }

    fn timeframe_offered(&self, tier: Tier, timeframe: Timeframe) -> bool {
        tier.has_plan(Tier::Premium) || self.config.analysis.standard_timeframes.contains(&timeframe)
    }

    async fn denied_until(
        &self,
        user: &UserId,
        feature: FeatureKey,
        tier: Tier,
    ) -> Result<Option<chrono::DateTime<chrono::Utc>>, MindlogError> {
        Ok(match self.quota.check(user, feature, tier).await? {
            QuotaDecision::Denied { next_allowed_at } => Some(next_allowed_at),
            _ => None,
        })
    }
}
