// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Args;

use gantry_core::{NewGroup, NewJob};
use gantry_engine::Config;
use gantry_store::{JobStore, SqliteStore};

use crate::Mode;

#[derive(Debug, Args)]
pub struct EnqueueArgs {
    /// Group name.
    #[arg(long)]
    pub name: String,

    /// Execution mode for the group.
    #[arg(long, value_enum, default_value = "serial")]
    pub mode: Mode,

    /// Command run once after the group finishes, whatever the outcome.
    #[arg(long)]
    pub finish: Option<String>,

    /// Job spec `name=<n>,action=<cmd>[,rollback=<cmd>]`; repeat in
    /// execution order.
    #[arg(long = "job", value_parser = parse_job_spec, required = true)]
    pub jobs: Vec<NewJob>,
}

/// Insert the group and print its id.
pub fn run(config: Config, args: EnqueueArgs) -> anyhow::Result<()> {
    let store = SqliteStore::open(&config.env.database)?;
    let group_id = store.insert_group(&NewGroup {
        name: args.name,
        uniq_key: config.env.uniqkey,
        kind: args.mode.into(),
        finish_command: args.finish,
        jobs: args.jobs,
    })?;
    println!("{group_id}");
    Ok(())
}

/// Parse `name=...,action=...[,rollback=...]`. The action may contain
/// commas; only the literal `,rollback=` marker splits it.
fn parse_job_spec(raw: &str) -> Result<NewJob, String> {
    let rest = raw
        .strip_prefix("name=")
        .ok_or_else(|| "job spec must start with name=".to_string())?;
    let (name, rest) = rest
        .split_once(",action=")
        .ok_or_else(|| "job spec needs ,action=".to_string())?;
    let (action, rollback) = match rest.split_once(",rollback=") {
        Some((action, rollback)) => (action, Some(rollback)),
        None => (rest, None),
    };
    if name.is_empty() {
        return Err("job name is empty".to_string());
    }
    if action.is_empty() {
        return Err("job action is empty".to_string());
    }
    let job = NewJob::new(name, action);
    Ok(match rollback {
        Some(rollback) if !rollback.is_empty() => job.with_rollback(rollback),
        _ => job,
    })
}

#[cfg(test)]
#[path = "enqueue_tests.rs"]
mod tests;
