// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage counters. Every mutation is one statement so concurrent requests for
//! the same (user, feature, window) cannot lose an update.

use chrono::{DateTime, Utc};
use mindlog_core::{FeatureKey, MindlogError, UserId};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err, to_db_time};

pub async fn get_count(
    db: &Database,
    user: &UserId,
    feature: FeatureKey,
    window_key: &str,
) -> Result<u32, MindlogError> {
    let (user, feature, window_key) = (user.0.clone(), feature.to_string(), window_key.to_string());
    let count = db
        .connection()
        .call(move |conn| -> Result<Option<u32>, rusqlite::Error> {
            conn.query_row(
                "SELECT count FROM usage_records
                 WHERE user_id = ?1 AND feature_key = ?2 AND window_key = ?3",
                params![user, feature, window_key],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    Ok(count.unwrap_or(0))
}

/// Creates the record at 1 or bumps it, unless it already holds `cap` uses.
///
/// Returns the new count, `None` when the cap stopped the increment.
pub async fn try_increment(
    db: &Database,
    user: &UserId,
    feature: FeatureKey,
    window_key: &str,
    cap: Option<u32>,
    now: DateTime<Utc>,
) -> Result<Option<u32>, MindlogError> {
    let (user, feature, window_key) = (user.0.clone(), feature.to_string(), window_key.to_string());
    let now = to_db_time(now);
    db.connection()
        .call(move |conn| -> Result<Option<u32>, rusqlite::Error> {
            conn.query_row(
                "INSERT INTO usage_records (user_id, feature_key, window_key, count, updated_at)
                 SELECT ?1, ?2, ?3, 1, ?5 WHERE ?4 IS NULL OR ?4 > 0
                 ON CONFLICT(user_id, feature_key, window_key) DO UPDATE
                     SET count = count + 1, updated_at = excluded.updated_at
                     WHERE ?4 IS NULL OR usage_records.count < ?4
                 RETURNING count",
                params![user, feature, window_key, cap, now],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Gives back one use. Never drops below zero.
pub async fn decrement(
    db: &Database,
    user: &UserId,
    feature: FeatureKey,
    window_key: &str,
    now: DateTime<Utc>,
) -> Result<(), MindlogError> {
    let (user, feature, window_key) = (user.0.clone(), feature.to_string(), window_key.to_string());
    let now = to_db_time(now);
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "UPDATE usage_records SET count = count - 1, updated_at = ?4
                 WHERE user_id = ?1 AND feature_key = ?2 AND window_key = ?3 AND count > 0",
                params![user, feature, window_key, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
