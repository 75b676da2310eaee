// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use gantry_core::GroupKind;
use gantry_engine::{Config, Scheduler};

pub async fn run(config: Config, kind: GroupKind) -> anyhow::Result<()> {
    let scheduler = Scheduler::new(config.channel(kind))?;
    tracing::info!(%kind, "scheduler started");

    tokio::select! {
        result = scheduler.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(%kind, "interrupt received, scheduler stopping");
        }
    }
    Ok(())
}
