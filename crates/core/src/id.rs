// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes for job groups and jobs.

crate::define_id! {
    /// Identifier of a job group row.
    pub struct GroupId;
}

crate::define_id! {
    /// Identifier of a job row.
    ///
    /// Exported to a running job's child process through the
    /// `GANTRY_JOB_ID` environment variable so a cooperating client can
    /// report progress back through the store.
    pub struct JobId;
}

/// Environment variable carrying the job identity into spawned commands.
pub const JOB_ID_ENV: &str = "GANTRY_JOB_ID";

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
