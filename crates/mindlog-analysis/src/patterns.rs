// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Emotional triggers across the most recent entries.
//!
//! Offered on every tier and not metered; the admission scheduler is the only
//! limit. Never cached.

use mindlog_core::{MindlogError, UserId};
use tracing::{info, warn};

use crate::decoder::decode;
use crate::fallback;
use crate::prompts::patterns_messages;
use crate::sanitize::sanitize_entry;
use crate::schema::EmotionalPatterns;
use crate::service::{Generated, ReportService};

impl ReportService {
    /// Names what most often lowers and lifts the user's mood.
    ///
    /// Inference errors are returned; output that cannot be decoded yields the
    /// flagged fallback.
    pub async fn generate_emotional_patterns(
        &self,
        user: &UserId,
    ) -> Result<Generated<EmotionalPatterns>, MindlogError> {
        let tier = self.plans.get_tier(user).await?;
        let analysis = &self.config.analysis;
        let entries = self
            .entries
            .find_recent(user, analysis.patterns_entry_window)
            .await?;
        let text = entries
            .iter()
            .map(|entry| sanitize_entry(&entry.content))
            .filter(|content| !content.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        if text.is_empty() {
            return Err(MindlogError::Validation(
                "not enough entries to look for patterns".into(),
            ));
        }

        let request = self.request(
            patterns_messages(&text),
            tier,
            analysis.patterns_max_tokens,
            true,
        );
        let completion = self.inference.complete(request).await.inspect_err(|e| {
            warn!(user = %user, error = %e, "emotional pattern analysis failed");
        })?;

        let decoded = decode(&completion.content)
            .and_then(|decoded| EmotionalPatterns::from_value(decoded.value));
        let generated_at = self.clock.now();
        match decoded {
            Ok(patterns) => {
                info!(user = %user, entries = entries.len(), "emotional patterns generated");
                Ok(Generated {
                    data: patterns,
                    generated_at,
                    fallback: false,
                })
            }
            Err(e) => {
                warn!(user = %user, error = %e, "emotional patterns unusable, returning fallback");
                Ok(Generated {
                    data: fallback::emotional_patterns(),
                    generated_at,
                    fallback: true,
                })
            }
        }
    }
}
