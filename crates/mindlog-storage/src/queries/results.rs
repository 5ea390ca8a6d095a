// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-entry analysis results, one row per entry.

use chrono::{DateTime, Utc};
use mindlog_core::{AnalysisResult, EntryId, MindlogError};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err, to_db_time};

/// Writes the result for an entry, replacing any previous one.
pub async fn write_result(
    db: &Database,
    entry: &EntryId,
    result: &AnalysisResult,
    now: DateTime<Utc>,
) -> Result<(), MindlogError> {
    let entry = entry.0.clone();
    let patterns = serde_json::to_string(&result.identified_patterns).map_err(MindlogError::storage)?;
    let strategies =
        serde_json::to_string(&result.suggested_strategies).map_err(MindlogError::storage)?;
    let supportive = result.supportive_text.clone();
    let processed = result.processed;
    let fallback = result.fallback;
    let now = to_db_time(now);
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO analysis_results
                     (entry_id, supportive_text, patterns_json, strategies_json, processed, fallback, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(entry_id) DO UPDATE SET
                     supportive_text = excluded.supportive_text,
                     patterns_json = excluded.patterns_json,
                     strategies_json = excluded.strategies_json,
                     processed = excluded.processed,
                     fallback = excluded.fallback,
                     updated_at = excluded.updated_at",
                params![entry, supportive, patterns, strategies, processed, fallback, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Flags the entry's analysis as outstanding without discarding earlier output.
pub async fn mark_pending(
    db: &Database,
    entry: &EntryId,
    now: DateTime<Utc>,
) -> Result<(), MindlogError> {
    let entry = entry.0.clone();
    let now = to_db_time(now);
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO analysis_results (entry_id, processed, updated_at)
                 VALUES (?1, 0, ?2)
                 ON CONFLICT(entry_id) DO UPDATE SET processed = 0, updated_at = excluded.updated_at",
                params![entry, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_result(
    db: &Database,
    entry: &EntryId,
) -> Result<Option<AnalysisResult>, MindlogError> {
    let entry = entry.0.clone();
    let row = db
        .connection()
        .call(
            move |conn| -> Result<Option<(String, String, String, bool, bool)>, rusqlite::Error> {
                conn.query_row(
                    "SELECT supportive_text, patterns_json, strategies_json, processed, fallback
                     FROM analysis_results WHERE entry_id = ?1",
                    params![entry],
                    |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                        ))
                    },
                )
                .optional()
            },
        )
        .await
        .map_err(map_tr_err)?;

    let Some((supportive_text, patterns, strategies, processed, fallback)) = row else {
        return Ok(None);
    };
    Ok(Some(AnalysisResult {
        supportive_text,
        identified_patterns: serde_json::from_str(&patterns).map_err(MindlogError::storage)?,
        suggested_strategies: serde_json::from_str(&strategies).map_err(MindlogError::storage)?,
        processed,
        fallback,
    }))
}
