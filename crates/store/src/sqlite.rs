// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed job store.
//!
//! One connection per process, serialized behind a mutex; concurrent
//! daemon processes coordinate through SQLite's own locking with a busy
//! timeout. Row updates are single statements, which gives the per-row
//! atomicity the claim protocol relies on.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};

use gantry_core::{
    clamped_progress, GroupId, GroupKind, GroupStatus, Job, JobGroup, JobId, JobStatus, NewGroup,
};

use crate::{JobStore, StoreError};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS jobgroup (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL,
    uniq_key        TEXT NOT NULL,
    finish_command  TEXT,
    kind            INTEGER NOT NULL,
    status          TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    modified_at     TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_jobgroup_dispatch
    ON jobgroup (kind, status, id);

CREATE TABLE IF NOT EXISTS job (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    group_id            INTEGER NOT NULL REFERENCES jobgroup (id) ON DELETE CASCADE,
    name                TEXT NOT NULL,
    ord                 INTEGER NOT NULL,
    action_command      TEXT NOT NULL,
    rollback_command    TEXT,
    status              TEXT NOT NULL,
    action_exit_code    INTEGER,
    action_stdout       TEXT,
    action_stderr       TEXT,
    rollback_exit_code  INTEGER,
    rollback_stdout     TEXT,
    rollback_stderr     TEXT,
    progress            INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL,
    modified_at         TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_job_group ON job (group_id, ord);
";

/// The shared durable store reached by every daemon process.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// In-memory store, private to this process. Used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        // journal_mode returns the resulting mode as a row.
        conn.query_row("PRAGMA journal_mode = wal", [], |_| Ok(()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

fn now_str() -> String {
    Utc::now().to_rfc3339()
}

fn parse_time(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_default()
}

fn group_from_row(row: &Row<'_>) -> Result<JobGroup, StoreError> {
    let id: u64 = row.get("id")?;
    let kind_raw: i64 = row.get("kind")?;
    let status_raw: String = row.get("status")?;
    let kind = GroupKind::from_i64(kind_raw).ok_or(StoreError::CorruptRow {
        column: "kind",
        value: kind_raw.to_string(),
        id,
    })?;
    let status = GroupStatus::from_store_str(&status_raw).ok_or(StoreError::CorruptRow {
        column: "status",
        value: status_raw.clone(),
        id,
    })?;
    let created: String = row.get("created_at")?;
    let modified: String = row.get("modified_at")?;
    Ok(JobGroup {
        id: GroupId(id),
        name: row.get("name")?,
        uniq_key: row.get("uniq_key")?,
        finish_command: row.get("finish_command")?,
        kind,
        status,
        created_at: parse_time(&created),
        modified_at: parse_time(&modified),
    })
}

fn job_from_row(row: &Row<'_>) -> Result<Job, StoreError> {
    let id: u64 = row.get("id")?;
    let status_raw: String = row.get("status")?;
    let status = JobStatus::from_store_str(&status_raw).ok_or(StoreError::CorruptRow {
        column: "status",
        value: status_raw.clone(),
        id,
    })?;
    let created: String = row.get("created_at")?;
    let modified: String = row.get("modified_at")?;
    Ok(Job {
        id: JobId(id),
        group_id: GroupId(row.get("group_id")?),
        name: row.get("name")?,
        order: row.get("ord")?,
        action_command: row.get("action_command")?,
        rollback_command: row.get("rollback_command")?,
        status,
        action_exit_code: row.get("action_exit_code")?,
        action_stdout: row.get("action_stdout")?,
        action_stderr: row.get("action_stderr")?,
        rollback_exit_code: row.get("rollback_exit_code")?,
        rollback_stdout: row.get("rollback_stdout")?,
        rollback_stderr: row.get("rollback_stderr")?,
        progress: row.get("progress")?,
        created_at: parse_time(&created),
        modified_at: parse_time(&modified),
    })
}

impl JobStore for SqliteStore {
    fn insert_group(&self, group: &NewGroup) -> Result<GroupId, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let now = now_str();
        tx.execute(
            "INSERT INTO jobgroup (name, uniq_key, finish_command, kind, status, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                group.name,
                group.uniq_key,
                group.finish_command,
                group.kind.as_i64(),
                GroupStatus::Pending.as_store_str(),
                now,
            ],
        )?;
        let group_id = tx.last_insert_rowid() as u64;
        for (order, job) in group.jobs.iter().enumerate() {
            tx.execute(
                "INSERT INTO job (group_id, name, ord, action_command, rollback_command, status, created_at, modified_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    group_id,
                    job.name,
                    order as u32,
                    job.action_command,
                    job.rollback_command,
                    JobStatus::Pending.as_store_str(),
                    now,
                ],
            )?;
        }
        tx.commit()?;
        tracing::debug!(group_id, jobs = group.jobs.len(), "inserted job group");
        Ok(GroupId(group_id))
    }

    fn find_group(&self, id: GroupId, uniq_key: &str) -> Result<Option<JobGroup>, StoreError> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT * FROM jobgroup WHERE id = ?1 AND uniq_key = ?2",
            params![id.as_u64(), uniq_key],
            |row| Ok(group_from_row(row)),
        )
        .optional()?
        .transpose()
    }

    fn groups_by_kind_status(
        &self,
        kind: GroupKind,
        status: GroupStatus,
        limit: Option<usize>,
    ) -> Result<Vec<JobGroup>, StoreError> {
        let conn = self.conn.lock();
        // -1 means "no limit" to SQLite.
        let limit = limit.map(|n| n as i64).unwrap_or(-1);
        let mut stmt = conn.prepare(
            "SELECT * FROM jobgroup WHERE kind = ?1 AND status = ?2 ORDER BY id ASC LIMIT ?3",
        )?;
        let rows = stmt.query_map(
            params![kind.as_i64(), status.as_store_str(), limit],
            |row| Ok(group_from_row(row)),
        )?;
        let mut groups = Vec::new();
        for row in rows {
            groups.push(row??);
        }
        Ok(groups)
    }

    fn update_group_status(&self, id: GroupId, status: GroupStatus) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE jobgroup SET status = ?1, modified_at = ?2 WHERE id = ?3",
            params![status.as_store_str(), now_str(), id.as_u64()],
        )?;
        Ok(())
    }

    fn claim_group(&self, id: GroupId, uniq_key: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE jobgroup SET status = ?1, modified_at = ?2
             WHERE id = ?3 AND uniq_key = ?4 AND status = ?5",
            params![
                GroupStatus::Running.as_store_str(),
                now_str(),
                id.as_u64(),
                uniq_key,
                GroupStatus::Pending.as_store_str(),
            ],
        )?;
        Ok(changed == 1)
    }

    fn delete_group(&self, id: GroupId) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        // ON DELETE CASCADE removes the jobs.
        conn.execute("DELETE FROM jobgroup WHERE id = ?1", params![id.as_u64()])?;
        Ok(())
    }

    fn jobs_by_group(&self, group_id: GroupId, descending: bool) -> Result<Vec<Job>, StoreError> {
        let conn = self.conn.lock();
        let sql = if descending {
            "SELECT * FROM job WHERE group_id = ?1 ORDER BY ord DESC"
        } else {
            "SELECT * FROM job WHERE group_id = ?1 ORDER BY ord ASC"
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![group_id.as_u64()], |row| Ok(job_from_row(row)))?;
        let mut jobs = Vec::new();
        for row in rows {
            jobs.push(row??);
        }
        Ok(jobs)
    }

    fn update_job_status(&self, id: JobId, status: JobStatus) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE job SET status = ?1, modified_at = ?2 WHERE id = ?3",
            params![status.as_store_str(), now_str(), id.as_u64()],
        )?;
        Ok(())
    }

    fn record_action_result(
        &self,
        id: JobId,
        exit_code: Option<i32>,
        stdout: &str,
        stderr: &str,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE job SET action_exit_code = ?1, action_stdout = ?2, action_stderr = ?3,
                            modified_at = ?4
             WHERE id = ?5",
            params![exit_code, stdout, stderr, now_str(), id.as_u64()],
        )?;
        Ok(())
    }

    fn record_rollback_result(
        &self,
        id: JobId,
        exit_code: Option<i32>,
        stdout: &str,
        stderr: &str,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE job SET rollback_exit_code = ?1, rollback_stdout = ?2, rollback_stderr = ?3,
                            modified_at = ?4
             WHERE id = ?5",
            params![exit_code, stdout, stderr, now_str(), id.as_u64()],
        )?;
        Ok(())
    }

    fn increment_progress(&self, id: JobId, delta: u8) -> Result<Option<u8>, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let current: Option<u8> = tx
            .query_row(
                "SELECT progress FROM job WHERE id = ?1",
                params![id.as_u64()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(current) = current else {
            return Ok(None);
        };
        let next = clamped_progress(current, delta);
        tx.execute(
            "UPDATE job SET progress = ?1, modified_at = ?2 WHERE id = ?3",
            params![next, now_str(), id.as_u64()],
        )?;
        tx.commit()?;
        Ok(Some(next))
    }

    fn progress(&self, id: JobId) -> Result<Option<u8>, StoreError> {
        let conn = self.conn.lock();
        let progress = conn
            .query_row(
                "SELECT progress FROM job WHERE id = ?1",
                params![id.as_u64()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(progress)
    }
}

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;
