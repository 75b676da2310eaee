// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job group record and state machine.

use crate::id::GroupId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Execution mode of a job group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// One group at a time, on the serial performer's single control path.
    Serial,
    /// Dispatched into the parallel performer's bounded worker pool.
    Parallel,
}

crate::simple_display! {
    GroupKind {
        Serial => "serial",
        Parallel => "parallel",
    }
}

impl GroupKind {
    /// Stable integer encoding used by the store.
    pub fn as_i64(self) -> i64 {
        match self {
            GroupKind::Serial => 0,
            GroupKind::Parallel => 1,
        }
    }

    pub fn from_i64(v: i64) -> Option<Self> {
        match v {
            0 => Some(GroupKind::Serial),
            1 => Some(GroupKind::Parallel),
            _ => None,
        }
    }
}

/// Status of a job group.
///
/// `Running` holds only while an engine invocation is active; `Ok`,
/// `Abnormal`, and `AppError` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    Pending,
    Running,
    Ok,
    /// At least one job failed; rollback was attempted.
    Abnormal,
    /// Unexpected orchestration error (store failure, worker panic).
    AppError,
}

crate::simple_display! {
    GroupStatus {
        Pending => "pending",
        Running => "running",
        Ok => "ok",
        Abnormal => "abnormal",
        AppError => "app_error",
    }
}

impl GroupStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, GroupStatus::Ok | GroupStatus::Abnormal | GroupStatus::AppError)
    }

    /// Stable string encoding used by the store.
    pub fn as_store_str(self) -> &'static str {
        match self {
            GroupStatus::Pending => "pending",
            GroupStatus::Running => "running",
            GroupStatus::Ok => "ok",
            GroupStatus::Abnormal => "abnormal",
            GroupStatus::AppError => "app_error",
        }
    }

    pub fn from_store_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(GroupStatus::Pending),
            "running" => Some(GroupStatus::Running),
            "ok" => Some(GroupStatus::Ok),
            "abnormal" => Some(GroupStatus::Abnormal),
            "app_error" => Some(GroupStatus::AppError),
            _ => None,
        }
    }
}

/// A named, ordered batch of jobs executed as one unit with one
/// terminal outcome.
///
/// The group exclusively owns its jobs; deleting a group cascades.
/// `uniq_key` is a UUID string scoping queries to a tenant/host: any two
/// daemons sharing the same key see the same job pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobGroup {
    pub id: GroupId,
    pub name: String,
    pub uniq_key: String,
    /// Post-execution hook run once per group regardless of outcome.
    pub finish_command: Option<String>,
    pub kind: GroupKind,
    pub status: GroupStatus,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl JobGroup {
    /// True when the group still qualifies for dispatch.
    pub fn is_pending(&self) -> bool {
        self.status == GroupStatus::Pending
    }
}

/// Input for creating a job group together with its jobs.
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub name: String,
    pub uniq_key: String,
    pub kind: GroupKind,
    pub finish_command: Option<String>,
    pub jobs: Vec<NewJob>,
}

/// Input for one job within a [`NewGroup`].
///
/// `order` is assigned by insertion position; jobs are created Pending.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub name: String,
    pub action_command: String,
    pub rollback_command: Option<String>,
}

impl NewJob {
    pub fn new(name: impl Into<String>, action_command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action_command: action_command.into(),
            rollback_command: None,
        }
    }

    pub fn with_rollback(mut self, rollback_command: impl Into<String>) -> Self {
        self.rollback_command = Some(rollback_command.into());
        self
    }
}

#[cfg(test)]
#[path = "group_tests.rs"]
mod tests;
