// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperating-client progress reporting. Action and rollback commands
//! get their job id through `GANTRY_JOB_ID` and call back into gantry
//! to publish how far along they are.

use clap::Subcommand;

use gantry_core::{JobId, JOB_ID_ENV};
use gantry_engine::Config;
use gantry_store::{JobStore, SqliteStore};

#[derive(Debug, Subcommand)]
pub enum ProgressAction {
    /// Print the current progress; -1 when there is no job context.
    Get,
    /// Increment progress, clamping at 100, and print the new value.
    Up { delta: u8 },
}

pub fn run(config: Config, action: ProgressAction) -> anyhow::Result<()> {
    let store = SqliteStore::open(&config.env.database)?;
    let job_id = std::env::var(JOB_ID_ENV)
        .ok()
        .and_then(|raw| raw.parse::<JobId>().ok());

    let value = match (action, job_id) {
        (_, None) => None,
        (ProgressAction::Get, Some(id)) => store.progress(id)?,
        (ProgressAction::Up { delta }, Some(id)) => store.increment_progress(id, delta)?,
    };
    println!("{}", value.map_or(-1, i64::from));
    Ok(())
}
