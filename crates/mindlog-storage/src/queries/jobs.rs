// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable analysis job queue.
//!
//! Jobs move `queued -> running -> {succeeded | queued | failed_terminal}`.
//! A claim is a lease: a worker that disappears leaves a `running` row whose
//! `locked_until` eventually passes, after which [`reclaim_expired`] hands it
//! back to the queue or terminates it.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use mindlog_core::{AnalysisJob, EntryId, JobId, JobStatus, MindlogError};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err, time_col, to_db_time};

const JOB_COLUMNS: &str =
    "id, entry_id, enqueued_at, attempt_count, max_attempts, status, run_at, last_error";

fn row_to_job(row: &rusqlite::Row<'_>) -> Result<AnalysisJob, rusqlite::Error> {
    let raw_status: String = row.get(5)?;
    let status = JobStatus::from_str(&raw_status).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(AnalysisJob {
        id: JobId(row.get(0)?),
        entry_id: EntryId(row.get(1)?),
        enqueued_at: time_col(row, 2)?,
        attempt_count: row.get(3)?,
        max_attempts: row.get(4)?,
        status,
        run_at: time_col(row, 6)?,
        last_error: row.get(7)?,
    })
}

/// Persists a new job, immediately claimable.
pub async fn enqueue(
    db: &Database,
    entry: &EntryId,
    max_attempts: u32,
    now: DateTime<Utc>,
) -> Result<AnalysisJob, MindlogError> {
    let job = AnalysisJob {
        id: JobId(uuid::Uuid::new_v4().to_string()),
        entry_id: entry.clone(),
        enqueued_at: now,
        attempt_count: 0,
        max_attempts: max_attempts.max(1),
        status: JobStatus::Queued,
        run_at: now,
        last_error: None,
    };
    let row = job.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let at = to_db_time(row.enqueued_at);
            conn.execute(
                "INSERT INTO analysis_jobs
                     (id, entry_id, status, attempt_count, max_attempts, run_at, enqueued_at, updated_at)
                 VALUES (?1, ?2, 'queued', 0, ?3, ?4, ?4, ?4)",
                params![row.id.0, row.entry_id.0, row.max_attempts, at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
    Ok(job)
}

/// Claims the oldest due job.
///
/// The select and the `queued -> running` flip share one transaction, and the
/// update re-checks the status, so a job is never handed to two workers.
pub async fn claim_next(
    db: &Database,
    now: DateTime<Utc>,
    lease_until: DateTime<Utc>,
) -> Result<Option<AnalysisJob>, MindlogError> {
    let now = to_db_time(now);
    let lease_until = to_db_time(lease_until);
    db.connection()
        .call(move |conn| -> Result<Option<AnalysisJob>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let candidate = tx
                .query_row(
                    &format!(
                        "SELECT {JOB_COLUMNS} FROM analysis_jobs
                         WHERE status = 'queued' AND run_at <= ?1
                           AND attempt_count < max_attempts
                         ORDER BY run_at ASC, enqueued_at ASC
                         LIMIT 1"
                    ),
                    params![now],
                    row_to_job,
                )
                .optional()?;

            let Some(job) = candidate else {
                tx.commit()?;
                return Ok(None);
            };

            let changed = tx.execute(
                "UPDATE analysis_jobs
                 SET status = 'running', attempt_count = attempt_count + 1,
                     locked_until = ?2, updated_at = ?3
                 WHERE id = ?1 AND status = 'queued'",
                params![job.id.0, lease_until, now],
            )?;
            tx.commit()?;

            if changed == 0 {
                return Ok(None);
            }
            Ok(Some(AnalysisJob {
                status: JobStatus::Running,
                attempt_count: job.attempt_count + 1,
                ..job
            }))
        })
        .await
        .map_err(map_tr_err)
}

/// Settles the running attempt as succeeded.
///
/// Every settle is fenced on `status = 'running'` and the claimed attempt, so a
/// worker whose lease was reclaimed cannot overwrite a later outcome. Returns
/// `false` when the fence rejected the write.
pub async fn mark_succeeded(
    db: &Database,
    job: &JobId,
    attempt: u32,
    now: DateTime<Utc>,
) -> Result<bool, MindlogError> {
    let (id, now) = (job.0.clone(), to_db_time(now));
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE analysis_jobs
                 SET status = 'succeeded', locked_until = NULL, last_error = NULL, updated_at = ?3
                 WHERE id = ?1 AND status = 'running' AND attempt_count = ?2",
                params![id, attempt, now],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Returns a running job to the queue, not claimable before `run_at`.
///
/// Ignored for a job that has used all its attempts; those must be failed.
pub async fn requeue(
    db: &Database,
    job: &JobId,
    attempt: u32,
    run_at: DateTime<Utc>,
    error: &str,
    now: DateTime<Utc>,
) -> Result<bool, MindlogError> {
    let (id, error) = (job.0.clone(), error.to_string());
    let (run_at, now) = (to_db_time(run_at), to_db_time(now));
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE analysis_jobs
                 SET status = 'queued', run_at = ?3, last_error = ?4,
                     locked_until = NULL, updated_at = ?5
                 WHERE id = ?1 AND status = 'running' AND attempt_count = ?2
                   AND attempt_count < max_attempts",
                params![id, attempt, run_at, error, now],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn mark_failed(
    db: &Database,
    job: &JobId,
    attempt: u32,
    error: &str,
    now: DateTime<Utc>,
) -> Result<bool, MindlogError> {
    let (id, error, now) = (job.0.clone(), error.to_string(), to_db_time(now));
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE analysis_jobs
                 SET status = 'failed_terminal', last_error = ?3,
                     locked_until = NULL, updated_at = ?4
                 WHERE id = ?1 AND status = 'running' AND attempt_count = ?2",
                params![id, attempt, error, now],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Recovers jobs whose lease lapsed.
///
/// Jobs with attempts left go back to `queued`; the rest become
/// `failed_terminal` and are returned so the caller can write their fallback.
pub async fn reclaim_expired(
    db: &Database,
    now: DateTime<Utc>,
) -> Result<Vec<AnalysisJob>, MindlogError> {
    let now = to_db_time(now);
    db.connection()
        .call(move |conn| -> Result<Vec<AnalysisJob>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let exhausted = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {JOB_COLUMNS} FROM analysis_jobs
                     WHERE status = 'running' AND locked_until < ?1
                       AND attempt_count >= max_attempts"
                ))?;
                let rows = stmt.query_map(params![now], row_to_job)?;
                rows.collect::<Result<Vec<_>, _>>()?
            };
            tx.execute(
                "UPDATE analysis_jobs
                 SET status = 'failed_terminal', locked_until = NULL,
                     last_error = COALESCE(last_error, 'lease expired'), updated_at = ?1
                 WHERE status = 'running' AND locked_until < ?1
                   AND attempt_count >= max_attempts",
                params![now],
            )?;
            tx.execute(
                "UPDATE analysis_jobs
                 SET status = 'queued', run_at = ?1, locked_until = NULL, updated_at = ?1
                 WHERE status = 'running' AND locked_until < ?1",
                params![now],
            )?;
            tx.commit()?;
            Ok(exhausted
                .into_iter()
                .map(|job| AnalysisJob {
                    status: JobStatus::FailedTerminal,
                    ..job
                })
                .collect())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_job(db: &Database, job: &JobId) -> Result<Option<AnalysisJob>, MindlogError> {
    let id = job.0.clone();
    db.connection()
        .call(move |conn| -> Result<Option<AnalysisJob>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {JOB_COLUMNS} FROM analysis_jobs WHERE id = ?1"),
                params![id],
                row_to_job,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn latest_for_entry(
    db: &Database,
    entry: &EntryId,
) -> Result<Option<AnalysisJob>, MindlogError> {
    let id = entry.0.clone();
    db.connection()
        .call(move |conn| -> Result<Option<AnalysisJob>, rusqlite::Error> {
            conn.query_row(
                &format!(
                    "SELECT {JOB_COLUMNS} FROM analysis_jobs WHERE entry_id = ?1
                     ORDER BY enqueued_at DESC, rowid DESC LIMIT 1"
                ),
                params![id],
                row_to_job,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Number of jobs in each status, for operator output.
pub async fn count_by_status(db: &Database) -> Result<BTreeMap<String, i64>, MindlogError> {
    db.connection()
        .call(|conn| -> Result<BTreeMap<String, i64>, rusqlite::Error> {
            let mut stmt =
                conn.prepare("SELECT status, COUNT(*) FROM analysis_jobs GROUP BY status")?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
