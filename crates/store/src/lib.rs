// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gantry-store: the durable job store shared by every daemon.
//!
//! All cross-process mutation goes through the [`JobStore`] trait. The
//! SQLite implementation is the production store; the in-memory one
//! backs tests and embedding.

mod error;
mod memory;
mod sqlite;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use gantry_core::{GroupId, GroupKind, GroupStatus, Job, JobGroup, JobId, JobStatus, NewGroup};

/// Query/update interface over job group and job records.
///
/// Implementations must provide per-row update atomicity:
/// [`JobStore::claim_group`] is an atomic pending-to-running transition,
/// so two performers can never both claim the same pending group.
pub trait JobStore: Send + Sync {
    /// Insert a group and its jobs (all created `Pending`); returns the
    /// assigned group id. Job `order` follows insertion position.
    fn insert_group(&self, group: &NewGroup) -> Result<GroupId, StoreError>;

    /// Look up a group by id, scoped to a uniq key.
    fn find_group(&self, id: GroupId, uniq_key: &str) -> Result<Option<JobGroup>, StoreError>;

    /// Groups matching kind and status, ordered by ascending id,
    /// optionally limited.
    fn groups_by_kind_status(
        &self,
        kind: GroupKind,
        status: GroupStatus,
        limit: Option<usize>,
    ) -> Result<Vec<JobGroup>, StoreError>;

    fn update_group_status(&self, id: GroupId, status: GroupStatus) -> Result<(), StoreError>;

    /// Atomically transition a pending group to running. Returns false
    /// when the group is absent or no longer pending (already claimed).
    fn claim_group(&self, id: GroupId, uniq_key: &str) -> Result<bool, StoreError>;

    /// Delete a group; cascades to its jobs.
    fn delete_group(&self, id: GroupId) -> Result<(), StoreError>;

    /// Jobs of a group ordered by `order`, ascending or descending.
    fn jobs_by_group(&self, group_id: GroupId, descending: bool) -> Result<Vec<Job>, StoreError>;

    fn update_job_status(&self, id: JobId, status: JobStatus) -> Result<(), StoreError>;

    /// Persist an action run's exit code and captured output. A `None`
    /// exit code records output only (whitelist rejections are never
    /// spawned, so they have no exit code).
    fn record_action_result(
        &self,
        id: JobId,
        exit_code: Option<i32>,
        stdout: &str,
        stderr: &str,
    ) -> Result<(), StoreError>;

    fn record_rollback_result(
        &self,
        id: JobId,
        exit_code: Option<i32>,
        stdout: &str,
        stderr: &str,
    ) -> Result<(), StoreError>;

    /// Increment a job's progress counter, clamping at 100. Returns the
    /// new value, or `None` when the job id is unknown.
    fn increment_progress(&self, id: JobId, delta: u8) -> Result<Option<u8>, StoreError>;

    /// Current progress counter, or `None` when the job id is unknown.
    fn progress(&self, id: JobId) -> Result<Option<u8>, StoreError>;
}

#[cfg(test)]
mod suite;
