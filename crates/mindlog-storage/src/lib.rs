// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for Mindlog.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed queries for journal
//! entries, plans, analysis results, the durable job queue, usage counters,
//! and the report cache. [`SqliteStorage`] implements every store trait from
//! `mindlog-core`.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
