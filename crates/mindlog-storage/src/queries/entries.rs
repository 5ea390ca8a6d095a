// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Journal entry reads plus the single write the CLI needs.

use chrono::{DateTime, Utc};
use mindlog_core::{EntryId, JournalEntry, MindlogError, UserId};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err, time_col, to_db_time};

const ENTRY_COLUMNS: &str = "id, user_id, entry_date, content, mood_score";

fn row_to_entry(row: &rusqlite::Row<'_>) -> Result<JournalEntry, rusqlite::Error> {
    Ok(JournalEntry {
        id: EntryId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        date: time_col(row, 2)?,
        content: row.get(3)?,
        mood_score: row.get(4)?,
    })
}

/// Inserts or replaces an entry (editing keeps the id).
pub async fn upsert_entry(db: &Database, entry: &JournalEntry) -> Result<(), MindlogError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO journal_entries (id, user_id, entry_date, content, mood_score)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET entry_date = excluded.entry_date,
                     content = excluded.content, mood_score = excluded.mood_score",
                params![
                    entry.id.0,
                    entry.user_id.0,
                    to_db_time(entry.date),
                    entry.content,
                    entry.mood_score
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_entry(db: &Database, id: &EntryId) -> Result<Option<JournalEntry>, MindlogError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| -> Result<Option<JournalEntry>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM journal_entries WHERE id = ?1"),
                params![id],
                row_to_entry,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Entries dated at or after `since`, oldest first.
pub async fn find_by_user_since(
    db: &Database,
    user: &UserId,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<JournalEntry>, MindlogError> {
    let user = user.0.clone();
    // The earliest representable bound stands in for "no lower bound".
    let since = since.map(to_db_time).unwrap_or_default();
    db.connection()
        .call(move |conn| -> Result<Vec<JournalEntry>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM journal_entries
                 WHERE user_id = ?1 AND entry_date >= ?2
                 ORDER BY entry_date ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![user, since], row_to_entry)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// The `limit` most recent entries, oldest first.
pub async fn find_recent(
    db: &Database,
    user: &UserId,
    limit: usize,
) -> Result<Vec<JournalEntry>, MindlogError> {
    let user = user.0.clone();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<Vec<JournalEntry>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM (
                     SELECT {ENTRY_COLUMNS} FROM journal_entries
                     WHERE user_id = ?1
                     ORDER BY entry_date DESC, id DESC
                     LIMIT ?2
                 ) ORDER BY entry_date ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![user, limit], row_to_entry)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, user: &str, day: u32, mood: Option<u8>) -> JournalEntry {
        JournalEntry {
            id: EntryId(id.into()),
            user_id: UserId(user.into()),
            date: DateTime::parse_from_rfc3339(&format!("2026-03-{day:02}T09:00:00Z"))
                .unwrap()
                .with_timezone(&Utc),
            content: format!("entry {id}"),
            mood_score: mood,
        }
    }

    async fn seeded() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        for e in [
            entry("a", "u1", 1, Some(4)),
            entry("b", "u1", 5, None),
            entry("c", "u1", 9, Some(8)),
            entry("x", "u2", 9, Some(2)),
        ] {
            upsert_entry(&db, &e).await.unwrap();
        }
        db
    }

    #[tokio::test]
    async fn since_filters_and_orders_oldest_first() {
        let db = seeded().await;
        let since = DateTime::parse_from_rfc3339("2026-03-04T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let found = find_by_user_since(&db, &UserId("u1".into()), Some(since))
            .await
            .unwrap();
        let ids: Vec<_> = found.iter().map(|e| e.id.0.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(found[0].mood_score, None);
    }

    #[tokio::test]
    async fn no_lower_bound_returns_everything() {
        let db = seeded().await;
        let found = find_by_user_since(&db, &UserId("u1".into()), None)
            .await
            .unwrap();
        assert_eq!(found.len(), 3);
    }

    #[tokio::test]
    async fn recent_keeps_the_newest() {
        let db = seeded().await;
        let found = find_recent(&db, &UserId("u1".into()), 2).await.unwrap();
        let ids: Vec<_> = found.iter().map(|e| e.id.0.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn edit_overwrites_in_place() {
        let db = seeded().await;
        let mut edited = entry("a", "u1", 1, Some(9));
        edited.content = "rewritten".into();
        upsert_entry(&db, &edited).await.unwrap();

        let got = get_entry(&db, &EntryId("a".into())).await.unwrap().unwrap();
        assert_eq!(got.content, "rewritten");
        assert_eq!(got.mood_score, Some(9));
        assert!(get_entry(&db, &EntryId("zz".into())).await.unwrap().is_none());
    }
}
