// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Three personal challenges drawn from the most recent entries.

use mindlog_core::{FeatureKey, MindlogError, UserId};
use tracing::{info, warn};

use crate::decoder::decode;
use crate::fallback;
use crate::prompts::challenge_messages;
use crate::sanitize::sanitize_entry;
use crate::schema::{Challenge, challenges_from_value};
use crate::service::{Generated, ReportService, ensure_allowed};

impl ReportService {
    /// Generates exactly three challenges.
    ///
    /// Any failure after the quota gate, including the inference call
    /// itself, degrades to the fixed fallback set.
    pub async fn generate_challenges(
        &self,
        user: &UserId,
    ) -> Result<Generated<Vec<Challenge>>, MindlogError> {
        let feature = FeatureKey::Challenges;
        let tier = self.plans.get_tier(user).await?;
        let decision = self.preflight(user, feature, tier).await?;
        ensure_allowed(&decision, feature)?;

        let analysis = &self.config.analysis;
        let entries = self
            .entries
            .find_recent(user, analysis.challenge_entry_window)
            .await?;
        if entries.is_empty() {
            return Err(MindlogError::Validation(
                "at least one entry is needed for challenges".into(),
            ));
        }

        let reservation = self.quota.check_and_reserve(user, feature, tier).await?;
        let text = entries
            .iter()
            .map(|entry| sanitize_entry(&entry.content))
            .filter(|content| !content.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        let request = self.request(
            challenge_messages(&text),
            tier,
            analysis.challenge_max_tokens,
            false,
        );

        let outcome = match self.inference.complete(request).await {
            Ok(completion) => {
                decode(&completion.content).and_then(|decoded| challenges_from_value(decoded.value))
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(challenges) => {
                let used = reservation.commit();
                info!(user = %user, used, "challenges generated");
                Ok(Generated {
                    data: challenges,
                    generated_at: self.clock.now(),
                    fallback: false,
                })
            }
            Err(e) => {
                warn!(user = %user, error = %e, "challenge generation failed, returning fallback set");
                self.quota.settle_fallback(reservation).await?;
                Ok(Generated {
                    data: fallback::challenges(),
                    generated_at: self.clock.now(),
                    fallback: true,
                })
            }
        }
    }
}
