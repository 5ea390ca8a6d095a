// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-entry analysis: sanitize, prompt, complete, decode, persist.
//!
//! This is the unit of work a background job runs. Errors propagate so the
//! worker can classify and retry them; [`EntryAnalyzer::write_fallback`] is
//! the terminal substitute once attempts are exhausted.

use std::sync::Arc;
use std::time::Duration;

use mindlog_config::MindlogConfig;
use mindlog_core::{
    AnalysisStore, EntryId, EntryStore, InferenceProvider, InferenceRequest, MindlogError,
};
use tracing::{debug, info};

use crate::decoder::decode;
use crate::fallback;
use crate::prompts::entry_messages;
use crate::sanitize::{sanitize_entry, truncate_chars};
use crate::schema::entry_analysis_from_value;

/// What happened to one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    Analyzed,
    /// The entry was deleted after the job was enqueued.
    Missing,
}

pub struct EntryAnalyzer {
    entries: Arc<dyn EntryStore>,
    results: Arc<dyn AnalysisStore>,
    inference: Arc<dyn InferenceProvider>,
    config: Arc<MindlogConfig>,
}

impl EntryAnalyzer {
    pub fn new(
        entries: Arc<dyn EntryStore>,
        results: Arc<dyn AnalysisStore>,
        inference: Arc<dyn InferenceProvider>,
        config: Arc<MindlogConfig>,
    ) -> Self {
        Self {
            entries,
            results,
            inference,
            config,
        }
    }

    /// Analyses one entry and overwrites its stored result.
    pub async fn analyze(&self, entry_id: &EntryId) -> Result<EntryOutcome, MindlogError> {
        let Some(entry) = self.entries.get_entry(entry_id).await? else {
            debug!(entry = %entry_id, "entry no longer exists, nothing to analyse");
            return Ok(EntryOutcome::Missing);
        };

        let analysis = &self.config.analysis;
        let clean = sanitize_entry(&entry.content);
        let content = truncate_chars(&clean, analysis.entry_input_chars);

        let request = InferenceRequest {
            messages: entry_messages(content),
            model: self.config.inference.model.clone(),
            temperature: analysis.entry_temperature,
            max_tokens: analysis.entry_max_tokens,
            timeout: Duration::from_secs(self.config.inference.timeout_secs),
            json_object: true,
        };

        let completion = self.inference.complete(request).await?;
        let decoded = decode(&completion.content)?;
        let result = entry_analysis_from_value(decoded.value)?;

        self.results.write_result(entry_id, &result).await?;
        info!(entry = %entry_id, stage = ?decoded.stage, "entry analysed");
        Ok(EntryOutcome::Analyzed)
    }

    /// Writes the canned result so the entry never stays unprocessed.
    pub async fn write_fallback(&self, entry_id: &EntryId) -> Result<(), MindlogError> {
        self.results
            .write_result(entry_id, &fallback::entry_result())
            .await?;
        info!(entry = %entry_id, "fallback analysis written");
        Ok(())
    }
}
