// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory job store for tests and single-process embedding.

use std::collections::BTreeMap;

use chrono::Utc;
use parking_lot::Mutex;

use gantry_core::{
    clamped_progress, GroupId, GroupKind, GroupStatus, Job, JobGroup, JobId, JobStatus, NewGroup,
};

use crate::{JobStore, StoreError};

#[derive(Default)]
struct State {
    groups: BTreeMap<u64, JobGroup>,
    jobs: BTreeMap<u64, Job>,
    next_group_id: u64,
    next_job_id: u64,
}

/// Mutex-guarded maps with the same contract as the SQLite store.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for MemoryStore {
    fn insert_group(&self, group: &NewGroup) -> Result<GroupId, StoreError> {
        let mut state = self.state.lock();
        state.next_group_id += 1;
        let group_id = GroupId(state.next_group_id);
        let now = Utc::now();
        state.groups.insert(
            group_id.as_u64(),
            JobGroup {
                id: group_id,
                name: group.name.clone(),
                uniq_key: group.uniq_key.clone(),
                finish_command: group.finish_command.clone(),
                kind: group.kind,
                status: GroupStatus::Pending,
                created_at: now,
                modified_at: now,
            },
        );
        for (order, job) in group.jobs.iter().enumerate() {
            state.next_job_id += 1;
            let job_id = state.next_job_id;
            state.jobs.insert(
                job_id,
                Job {
                    id: JobId(job_id),
                    group_id,
                    name: job.name.clone(),
                    order: order as u32,
                    action_command: job.action_command.clone(),
                    rollback_command: job.rollback_command.clone(),
                    status: JobStatus::Pending,
                    action_exit_code: None,
                    action_stdout: None,
                    action_stderr: None,
                    rollback_exit_code: None,
                    rollback_stdout: None,
                    rollback_stderr: None,
                    progress: 0,
                    created_at: now,
                    modified_at: now,
                },
            );
        }
        Ok(group_id)
    }

    fn find_group(&self, id: GroupId, uniq_key: &str) -> Result<Option<JobGroup>, StoreError> {
        let state = self.state.lock();
        Ok(state
            .groups
            .get(&id.as_u64())
            .filter(|g| g.uniq_key == uniq_key)
            .cloned())
    }

    fn groups_by_kind_status(
        &self,
        kind: GroupKind,
        status: GroupStatus,
        limit: Option<usize>,
    ) -> Result<Vec<JobGroup>, StoreError> {
        let state = self.state.lock();
        // BTreeMap iteration is already ascending by id.
        let iter = state
            .groups
            .values()
            .filter(|g| g.kind == kind && g.status == status)
            .cloned();
        Ok(match limit {
            Some(n) => iter.take(n).collect(),
            None => iter.collect(),
        })
    }

    fn update_group_status(&self, id: GroupId, status: GroupStatus) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if let Some(group) = state.groups.get_mut(&id.as_u64()) {
            group.status = status;
            group.modified_at = Utc::now();
        }
        Ok(())
    }

    fn claim_group(&self, id: GroupId, uniq_key: &str) -> Result<bool, StoreError> {
        let mut state = self.state.lock();
        match state.groups.get_mut(&id.as_u64()) {
            Some(group)
                if group.uniq_key == uniq_key && group.status == GroupStatus::Pending =>
            {
                group.status = GroupStatus::Running;
                group.modified_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn delete_group(&self, id: GroupId) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.groups.remove(&id.as_u64());
        state.jobs.retain(|_, job| job.group_id != id);
        Ok(())
    }

    fn jobs_by_group(&self, group_id: GroupId, descending: bool) -> Result<Vec<Job>, StoreError> {
        let state = self.state.lock();
        let mut jobs: Vec<Job> = state
            .jobs
            .values()
            .filter(|j| j.group_id == group_id)
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.order);
        if descending {
            jobs.reverse();
        }
        Ok(jobs)
    }

    fn update_job_status(&self, id: JobId, status: JobStatus) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if let Some(job) = state.jobs.get_mut(&id.as_u64()) {
            job.status = status;
            job.modified_at = Utc::now();
        }
        Ok(())
    }

    fn record_action_result(
        &self,
        id: JobId,
        exit_code: Option<i32>,
        stdout: &str,
        stderr: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if let Some(job) = state.jobs.get_mut(&id.as_u64()) {
            job.action_exit_code = exit_code;
            job.action_stdout = Some(stdout.to_string());
            job.action_stderr = Some(stderr.to_string());
            job.modified_at = Utc::now();
        }
        Ok(())
    }

    fn record_rollback_result(
        &self,
        id: JobId,
        exit_code: Option<i32>,
        stdout: &str,
        stderr: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if let Some(job) = state.jobs.get_mut(&id.as_u64()) {
            job.rollback_exit_code = exit_code;
            job.rollback_stdout = Some(stdout.to_string());
            job.rollback_stderr = Some(stderr.to_string());
            job.modified_at = Utc::now();
        }
        Ok(())
    }

    fn increment_progress(&self, id: JobId, delta: u8) -> Result<Option<u8>, StoreError> {
        let mut state = self.state.lock();
        Ok(state.jobs.get_mut(&id.as_u64()).map(|job| {
            job.progress = clamped_progress(job.progress, delta);
            job.modified_at = Utc::now();
            job.progress
        }))
    }

    fn progress(&self, id: JobId) -> Result<Option<u8>, StoreError> {
        let state = self.state.lock();
        Ok(state.jobs.get(&id.as_u64()).map(|j| j.progress))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
