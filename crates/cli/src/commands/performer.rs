// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use gantry_core::GroupKind;
use gantry_engine::{Config, Performer, PerformerExit, ShellRunner};
use gantry_store::{JobStore, SqliteStore};

pub async fn run(config: Config, kind: GroupKind) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let store: Arc<dyn JobStore> = Arc::new(SqliteStore::open(&config.env.database)?);
    let mut performer = Performer::new(Arc::clone(&config), kind, store, ShellRunner)?;
    tracing::info!(%kind, "performer started");

    tokio::select! {
        exit = performer.run() => {
            let PerformerExit::Stop = exit?;
            tracing::info!(%kind, "performer stopped by signal code");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(%kind, "interrupt received, performer stopping");
        }
    }
    Ok(())
}
