// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Group execution state machine.
//!
//! One `process` call drives a job group from Running to a terminal
//! status: the action phase walks the jobs in order and stops at the
//! first failure; a failed group then rolls back in reverse; the finish
//! hook runs exactly once either way.

use std::sync::Arc;

use gantry_core::{GroupId, GroupStatus, Job, JobGroup, JobStatus};
use gantry_store::JobStore;

use crate::config::Config;
use crate::error::EngineError;
use crate::runner::{ProcessRunner, RunOutcome, RunSpec, SYNTHETIC_EXIT};
use crate::whitelist::Whitelist;

const WHITELIST_NOTE: &str = "command rejected by whitelist; not executed\n";

pub struct GroupWorker<R> {
    store: Arc<dyn JobStore>,
    runner: R,
    whitelist: Whitelist,
    config: Arc<Config>,
}

impl<R: ProcessRunner> GroupWorker<R> {
    pub fn new(store: Arc<dyn JobStore>, runner: R, whitelist: Whitelist, config: Arc<Config>) -> Self {
        Self { store, runner, whitelist, config }
    }

    /// Execute the group. Returns the terminal status, or `None` when
    /// no group with this id exists under our uniqkey.
    ///
    /// Store failures mid-run force the group to `AppError` and skip
    /// the remaining phases.
    pub async fn process(&self, group_id: GroupId) -> Option<GroupStatus> {
        let group = match self.store.find_group(group_id, &self.config.env.uniqkey) {
            Ok(Some(group)) => group,
            Ok(None) => {
                tracing::warn!(%group_id, "no such group under this uniqkey, skipping");
                return None;
            }
            Err(error) => {
                tracing::error!(%group_id, %error, "group lookup failed");
                return None;
            }
        };

        let status = match self.execute(&group).await {
            Ok(status) => status,
            Err(error) => {
                tracing::error!(%group_id, %error, "group execution aborted");
                if let Err(error) = self.store.update_group_status(group_id, GroupStatus::AppError) {
                    tracing::error!(%group_id, %error, "failed to record app_error status");
                }
                GroupStatus::AppError
            }
        };
        tracing::info!(%group_id, name = %group.name, %status, "group finished");
        Some(status)
    }

    async fn execute(&self, group: &JobGroup) -> Result<GroupStatus, EngineError> {
        self.store.update_group_status(group.id, GroupStatus::Running)?;
        let jobs = self.store.jobs_by_group(group.id, false)?;

        let mut all_ok = true;
        for job in &jobs {
            if !self.run_action(job).await? {
                all_ok = false;
                break;
            }
        }

        let status = if all_ok {
            GroupStatus::Ok
        } else {
            GroupStatus::Abnormal
        };
        self.store.update_group_status(group.id, status)?;
        if status == GroupStatus::Abnormal {
            self.rollback(group).await?;
        }

        self.finish(group).await;
        Ok(status)
    }

    /// Run one job's action. Returns whether the phase may continue.
    async fn run_action(&self, job: &Job) -> Result<bool, EngineError> {
        self.store.update_job_status(job.id, JobStatus::Running)?;

        if !self.whitelist.permits(&job.action_command) {
            tracing::warn!(job_id = %job.id, command = %job.action_command, "action rejected by whitelist");
            self.store.record_action_result(job.id, None, "", WHITELIST_NOTE)?;
            self.store.update_job_status(job.id, JobStatus::WhitelistReject)?;
            return Ok(false);
        }

        let spec = RunSpec::from_config(&self.config, &job.action_command, Some(job.id));
        let outcome = self.run_command(&spec).await?;
        self.store.record_action_result(
            job.id,
            Some(outcome.exit_code),
            &outcome.stdout,
            &outcome.stderr,
        )?;
        if outcome.succeeded() {
            self.store.update_job_status(job.id, JobStatus::Ok)?;
            Ok(true)
        } else {
            tracing::warn!(
                job_id = %job.id,
                exit_code = outcome.exit_code,
                timed_out = outcome.timed_out,
                "action failed"
            );
            self.store.update_job_status(job.id, JobStatus::Abnormal)?;
            Ok(false)
        }
    }

    /// Undo phase: every job that got as far as Running, newest first,
    /// gets its rollback command run. Rollback failures are recorded
    /// and never retried.
    async fn rollback(&self, group: &JobGroup) -> Result<(), EngineError> {
        let jobs = self.store.jobs_by_group(group.id, true)?;
        for job in jobs {
            if !job.status.rollback_eligible() || !job.is_rollback_capable() {
                continue;
            }
            let Some(command) = job.rollback_command.as_deref() else {
                continue;
            };
            self.store.update_job_status(job.id, JobStatus::RollbackRunning)?;

            if !self.whitelist.permits(command) {
                tracing::warn!(job_id = %job.id, command, "rollback rejected by whitelist");
                self.store.record_rollback_result(job.id, None, "", WHITELIST_NOTE)?;
                self.store.update_job_status(job.id, JobStatus::RollbackWhitelistReject)?;
                continue;
            }

            let spec = RunSpec::from_config(&self.config, command, Some(job.id));
            let outcome = self.run_command(&spec).await?;
            self.store.record_rollback_result(
                job.id,
                Some(outcome.exit_code),
                &outcome.stdout,
                &outcome.stderr,
            )?;
            let status = if outcome.succeeded() {
                JobStatus::RollbackOk
            } else {
                tracing::warn!(job_id = %job.id, exit_code = outcome.exit_code, "rollback failed");
                JobStatus::RollbackAbnormal
            };
            self.store.update_job_status(job.id, status)?;
        }
        Ok(())
    }

    /// Post-execution hook. Outcome is logged only; a broken finish
    /// command never changes the group's status.
    async fn finish(&self, group: &JobGroup) {
        let Some(command) = group.finish_command.as_deref() else {
            return;
        };
        if command.trim().is_empty() {
            return;
        }
        if !self.whitelist.permits(command) {
            tracing::warn!(group_id = %group.id, command, "finish command rejected by whitelist");
            return;
        }
        let spec = RunSpec::from_config(&self.config, command, None);
        match self.run_command(&spec).await {
            Ok(outcome) if outcome.succeeded() => {
                tracing::debug!(group_id = %group.id, "finish command ran");
            }
            Ok(outcome) => {
                tracing::warn!(group_id = %group.id, exit_code = outcome.exit_code, "finish command failed");
            }
            Err(error) => {
                tracing::warn!(group_id = %group.id, %error, "finish command error");
            }
        }
    }

    /// Spawn failures (missing binary, empty command) count as command
    /// failures, not engine errors.
    async fn run_command(&self, spec: &RunSpec) -> Result<RunOutcome, EngineError> {
        match self.runner.run(spec).await {
            Ok(outcome) => Ok(outcome),
            Err(EngineError::Spawn { command, source }) => {
                tracing::warn!(%command, error = %source, "spawn failed");
                Ok(RunOutcome {
                    exit_code: SYNTHETIC_EXIT,
                    stdout: String::new(),
                    stderr: format!("failed to spawn {command:?}: {source}\n"),
                    timed_out: false,
                })
            }
            Err(other) => Err(other),
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
