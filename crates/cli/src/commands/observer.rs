// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;
use std::sync::Arc;

use anyhow::bail;

use gantry_core::SystemClock;
use gantry_engine::{Config, Observer, ObserverOutcome};

/// Run the supervisor until a crash loop or an interrupt. The children
/// are always torn down before returning.
pub async fn run(config: Config, config_path: &Path) -> anyhow::Result<()> {
    let mut observer = Observer::new(Arc::new(config), config_path, SystemClock);

    let outcome = tokio::select! {
        outcome = observer.run() => Some(outcome),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, shutting down");
            None
        }
    };
    // Tear the children down even when run() itself failed, so they
    // get the SIGTERM fan-out rather than a kill on drop.
    observer.shutdown().await;

    match outcome {
        Some(Ok(ObserverOutcome::CrashLoop)) => bail!("daemon crash loop, supervision aborted"),
        Some(Err(error)) => Err(error.into()),
        None => Ok(()),
    }
}
