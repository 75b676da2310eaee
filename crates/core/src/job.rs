// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record and per-job state machine.

use crate::id::{GroupId, JobId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound for a job's progress counter.
pub const MAX_PROGRESS: u8 = 100;

/// Status of a job.
///
/// Action phase: `Pending → Running → {Ok | Abnormal | WhitelistReject}`.
/// Rollback phase (only entered for jobs that reached Running/Ok/Abnormal
/// when their group failed): `RollbackRunning → {RollbackOk |
/// RollbackAbnormal | RollbackWhitelistReject}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Ok,
    Abnormal,
    /// Action command name missing from the whitelist; never spawned.
    WhitelistReject,
    RollbackRunning,
    RollbackOk,
    RollbackAbnormal,
    RollbackWhitelistReject,
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Running => "running",
        Ok => "ok",
        Abnormal => "abnormal",
        WhitelistReject => "whitelist_reject",
        RollbackRunning => "rollback_running",
        RollbackOk => "rollback_ok",
        RollbackAbnormal => "rollback_abnormal",
        RollbackWhitelistReject => "rollback_whitelist_reject",
    }
}

impl JobStatus {
    /// Stable string encoding used by the store.
    pub fn as_store_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Ok => "ok",
            JobStatus::Abnormal => "abnormal",
            JobStatus::WhitelistReject => "whitelist_reject",
            JobStatus::RollbackRunning => "rollback_running",
            JobStatus::RollbackOk => "rollback_ok",
            JobStatus::RollbackAbnormal => "rollback_abnormal",
            JobStatus::RollbackWhitelistReject => "rollback_whitelist_reject",
        }
    }

    pub fn from_store_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "running" => Some(JobStatus::Running),
            "ok" => Some(JobStatus::Ok),
            "abnormal" => Some(JobStatus::Abnormal),
            "whitelist_reject" => Some(JobStatus::WhitelistReject),
            "rollback_running" => Some(JobStatus::RollbackRunning),
            "rollback_ok" => Some(JobStatus::RollbackOk),
            "rollback_abnormal" => Some(JobStatus::RollbackAbnormal),
            "rollback_whitelist_reject" => Some(JobStatus::RollbackWhitelistReject),
            _ => None,
        }
    }

    /// True for the action-phase statuses that make a job eligible for
    /// rollback once its group fails.
    pub fn rollback_eligible(self) -> bool {
        matches!(self, JobStatus::Running | JobStatus::Ok | JobStatus::Abnormal)
    }
}

/// One shell-command step within a job group, with an optional
/// compensating rollback command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub group_id: GroupId,
    pub name: String,
    /// Zero-based execution position, unique within the group. Job `n`
    /// runs only after job `n - 1` succeeded.
    pub order: u32,
    pub action_command: String,
    pub rollback_command: Option<String>,
    pub status: JobStatus,
    pub action_exit_code: Option<i32>,
    pub action_stdout: Option<String>,
    pub action_stderr: Option<String>,
    pub rollback_exit_code: Option<i32>,
    pub rollback_stdout: Option<String>,
    pub rollback_stderr: Option<String>,
    /// Progress counter in `[0, 100]`, monotonically increasing,
    /// written only through the store's progress operations.
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Job {
    /// A job is rollback-capable iff its rollback command is non-empty.
    pub fn is_rollback_capable(&self) -> bool {
        self.rollback_command
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty())
    }
}

/// Clamp-add for the progress counter: increments overshoot to exactly
/// [`MAX_PROGRESS`], never beyond.
pub fn clamped_progress(current: u8, delta: u8) -> u8 {
    current.saturating_add(delta).min(MAX_PROGRESS)
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
