// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deep report over the trailing month of entries. Never cached.

use chrono::Duration;
use mindlog_core::{FeatureKey, MindlogError, UserId};
use tracing::{info, warn};

use crate::decoder::decode;
use crate::fallback;
use crate::prompts::monthly_messages;
use crate::schema::MonthlyReport;
use crate::service::{Generated, ReportService, ensure_allowed};
use crate::summarize::digest;

impl ReportService {
    pub async fn generate_monthly_report(
        &self,
        user: &UserId,
    ) -> Result<Generated<MonthlyReport>, MindlogError> {
        let feature = FeatureKey::Monthly;
        let tier = self.plans.get_tier(user).await?;
        let decision = self.preflight(user, feature, tier).await?;
        ensure_allowed(&decision, feature)?;

        let analysis = &self.config.analysis;
        let since = self.clock.now() - Duration::days(i64::from(analysis.monthly_window_days));
        let entries = self.entries.find_by_user_since(user, Some(since)).await?;
        if entries.is_empty() {
            return Err(MindlogError::Validation(format!(
                "no entries in the last {} days",
                analysis.monthly_window_days
            )));
        }

        let reservation = self.quota.check_and_reserve(user, feature, tier).await?;
        let text = digest(&entries, entries.len(), analysis.digest_entry_chars);
        let request = self.request(
            monthly_messages(&text),
            tier,
            analysis.monthly_max_tokens,
            true,
        );

        let completion = match self.inference.complete(request).await {
            Ok(completion) => completion,
            Err(e) => {
                warn!(user = %user, error = %e, "monthly report generation failed");
                reservation.release().await.ok();
                return Err(e);
            }
        };

        match decode(&completion.content).and_then(|decoded| MonthlyReport::from_value(decoded.value)) {
            Ok(report) => {
                let used = reservation.commit();
                info!(user = %user, used, entries = entries.len(), "monthly report generated");
                Ok(Generated {
                    data: report,
                    generated_at: self.clock.now(),
                    fallback: false,
                })
            }
            Err(e) => {
                warn!(user = %user, error = %e, "monthly report output unusable, returning fallback");
                self.quota.settle_fallback(reservation).await?;
                Ok(Generated {
                    data: fallback::monthly_report(&entries),
                    generated_at: self.clock.now(),
                    fallback: true,
                })
            }
        }
    }
}
