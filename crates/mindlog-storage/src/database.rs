// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread, which is what makes each query module's read-modify-write
//! sequences atomic with respect to one another.

use chrono::{DateTime, SecondsFormat, Utc};
use mindlog_core::MindlogError;
use tracing::debug;

use crate::migrations;

/// Handle to the Mindlog SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if needed) the database file in WAL mode and migrates it.
    pub async fn open(path: &str) -> Result<Self, MindlogError> {
        Self::open_with(path, true).await
    }

    /// Opens the database file, choosing the journal mode explicitly.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, MindlogError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(MindlogError::storage)?;
        let db = Self { conn };
        db.prepare(wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// Opens a private in-memory database, used by tests and dry runs.
    pub async fn open_in_memory() -> Result<Self, MindlogError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(MindlogError::storage)?;
        let db = Self { conn };
        db.prepare(false).await?;
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), MindlogError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                if wal_mode {
                    conn.pragma_update(None, "journal_mode", "WAL")?;
                    conn.pragma_update(None, "synchronous", "NORMAL")?;
                }
                conn.pragma_update(None, "foreign_keys", "ON")?;
                conn.busy_timeout(std::time::Duration::from_secs(5))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        self.conn
            .call(|conn| -> Result<(), MindlogError> { migrations::run_migrations(conn) })
            .await
            .map_err(|e| MindlogError::Storage {
                source: format!("migration failed: {e}").into(),
            })
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Flushes the WAL into the main database file.
    pub async fn close(&self) -> Result<(), MindlogError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Converts a tokio-rusqlite error into the storage variant.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> MindlogError {
    MindlogError::Storage {
        source: Box::new(e),
    }
}

/// Renders a timestamp in the fixed-width form stored in every TEXT time column,
/// so that string order equals time order.
pub(crate) fn to_db_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a stored timestamp, reporting the column on failure.
pub(crate) fn from_db_time(idx: usize, raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Reads a TEXT time column.
pub(crate) fn time_col(row: &rusqlite::Row<'_>, idx: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    from_db_time(idx, &raw)
}

/// Reads a nullable TEXT time column.
pub(crate) fn opt_time_col(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> Result<Option<DateTime<Utc>>, rusqlite::Error> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|r| from_db_time(idx, &r)).transpose()
}
