// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report cache rows keyed by (user, timeframe key).

use chrono::{DateTime, Utc};
use mindlog_core::{CacheEntry, MindlogError, UserId};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err, time_col, to_db_time};

/// Row as read, before the JSON payload is parsed.
type RawRow = (String, String, String, DateTime<Utc>);

fn row_to_raw(row: &rusqlite::Row<'_>) -> Result<RawRow, rusqlite::Error> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, time_col(row, 3)?))
}

fn into_entry((user_id, timeframe_key, data, generated_at): RawRow) -> Result<CacheEntry, MindlogError> {
    Ok(CacheEntry {
        user_id: UserId(user_id),
        timeframe_key,
        data: serde_json::from_str(&data).map_err(MindlogError::storage)?,
        generated_at,
    })
}

pub async fn get(
    db: &Database,
    user: &UserId,
    timeframe_key: &str,
) -> Result<Option<CacheEntry>, MindlogError> {
    let (user, key) = (user.0.clone(), timeframe_key.to_string());
    let raw = db
        .connection()
        .call(move |conn| -> Result<Option<RawRow>, rusqlite::Error> {
            conn.query_row(
                "SELECT user_id, timeframe_key, data_json, generated_at
                 FROM report_cache WHERE user_id = ?1 AND timeframe_key = ?2",
                params![user, key],
                row_to_raw,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    raw.map(into_entry).transpose()
}

/// Overwrites the entry unless the stored one is newer, then returns what is stored.
///
/// A generation that finishes late therefore never rolls `generated_at` back.
pub async fn upsert(db: &Database, entry: CacheEntry) -> Result<CacheEntry, MindlogError> {
    let data = serde_json::to_string(&entry.data).map_err(MindlogError::storage)?;
    let user = entry.user_id.0.clone();
    let key = entry.timeframe_key.clone();
    let generated_at = to_db_time(entry.generated_at);
    let raw = db
        .connection()
        .call(move |conn| -> Result<RawRow, rusqlite::Error> {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO report_cache (user_id, timeframe_key, data_json, generated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id, timeframe_key) DO UPDATE
                     SET data_json = excluded.data_json, generated_at = excluded.generated_at
                     WHERE excluded.generated_at >= report_cache.generated_at",
                params![user, key, data, generated_at],
            )?;
            let stored = tx.query_row(
                "SELECT user_id, timeframe_key, data_json, generated_at
                 FROM report_cache WHERE user_id = ?1 AND timeframe_key = ?2",
                params![user, key],
                row_to_raw,
            )?;
            tx.commit()?;
            Ok(stored)
        })
        .await
        .map_err(map_tr_err)?;
    into_entry(raw)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn entry(data: serde_json::Value, generated_at: DateTime<Utc>) -> CacheEntry {
        CacheEntry {
            user_id: UserId("u1".into()),
            timeframe_key: "week".into(),
            data,
            generated_at,
        }
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserId("u1".into());
        assert!(get(&db, &user, "week").await.unwrap().is_none());

        let t0 = at("2026-03-01T10:00:00Z");
        upsert(&db, entry(json!({"progress": "steady"}), t0)).await.unwrap();

        let hit = get(&db, &user, "week").await.unwrap().unwrap();
        assert_eq!(hit.generated_at, t0);
        assert_eq!(hit.data["progress"], "steady");
        assert!(get(&db, &user, "month").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn newer_generation_overwrites() {
        let db = Database::open_in_memory().await.unwrap();
        let t0 = at("2026-03-01T10:00:00Z");
        upsert(&db, entry(json!({"v": 1}), t0)).await.unwrap();
        let stored = upsert(&db, entry(json!({"v": 2}), t0 + Duration::hours(1)))
            .await
            .unwrap();
        assert_eq!(stored.data["v"], 2);
        assert_eq!(stored.generated_at, t0 + Duration::hours(1));
    }

    #[tokio::test]
    async fn late_older_write_does_not_roll_back() {
        let db = Database::open_in_memory().await.unwrap();
        let t1 = at("2026-03-01T11:00:00Z");
        upsert(&db, entry(json!({"v": "new"}), t1)).await.unwrap();

        let stored = upsert(&db, entry(json!({"v": "stale"}), t1 - Duration::hours(1)))
            .await
            .unwrap();
        assert_eq!(stored.generated_at, t1);
        assert_eq!(stored.data["v"], "new");
    }
}
