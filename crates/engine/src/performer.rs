// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Performer daemon: executes job groups when the scheduler signals.
//!
//! Serial mode runs one group at a time on the control path; parallel
//! mode dispatches into the bounded worker pool.

use std::sync::Arc;

use gantry_core::{GroupKind, GroupStatus};
use gantry_store::JobStore;

use crate::config::Config;
use crate::error::EngineError;
use crate::pool::WorkerPool;
use crate::runner::ProcessRunner;
use crate::signal::SignalChannel;
use crate::whitelist::Whitelist;
use crate::worker::GroupWorker;

/// Why the performer loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformerExit {
    /// Stop code received; this is the clean shutdown path.
    Stop,
}

pub struct Performer<R> {
    config: Arc<Config>,
    kind: GroupKind,
    channel: SignalChannel,
    store: Arc<dyn JobStore>,
    worker: Arc<GroupWorker<R>>,
    pool: Option<WorkerPool<R>>,
}

impl<R: ProcessRunner + Send + Sync + 'static> Performer<R> {
    pub fn new(
        config: Arc<Config>,
        kind: GroupKind,
        store: Arc<dyn JobStore>,
        runner: R,
    ) -> Result<Self, EngineError> {
        let channel = SignalChannel::ensure(&config.channel(kind).fifo_path)?;
        let whitelist = Whitelist::from_config(&config.job.whitelist)?;
        let worker = Arc::new(GroupWorker::new(
            Arc::clone(&store),
            runner,
            whitelist,
            Arc::clone(&config),
        ));
        let pool = match kind {
            GroupKind::Serial => None,
            GroupKind::Parallel => Some(WorkerPool::new(
                Arc::clone(&worker),
                Arc::clone(&store),
                config.channel(kind).pool_size,
            )),
        };
        Ok(Self { config, kind, channel, store, worker, pool })
    }

    /// Block on the signal channel and dispatch until the stop code
    /// arrives. Unknown codes are logged and ignored.
    pub async fn run(&mut self) -> Result<PerformerExit, EngineError> {
        let channel_config = self.config.channel(self.kind).clone();
        loop {
            let code = self.channel.recv().await?;
            if code == channel_config.stop_code {
                tracing::info!(kind = %self.kind, "stop signal received, shutting down");
                if let Some(pool) = &mut self.pool {
                    pool.drain().await;
                }
                return Ok(PerformerExit::Stop);
            }
            if code != channel_config.start_code {
                tracing::warn!(kind = %self.kind, code, "illegal signal code, ignoring");
                continue;
            }
            // Dispatch failures never take the daemon down; the next
            // tick retries whatever is still pending.
            if let Err(error) = self.dispatch().await {
                tracing::error!(kind = %self.kind, %error, "dispatch cycle failed");
            }
        }
    }

    /// One dispatch cycle over the pending groups of our kind.
    pub async fn dispatch(&mut self) -> Result<(), EngineError> {
        let uniq_key = self.config.env.uniqkey.clone();
        match self.kind {
            GroupKind::Serial => {
                let pending =
                    self.store
                        .groups_by_kind_status(GroupKind::Serial, GroupStatus::Pending, None)?;
                for group in pending {
                    if !self.store.claim_group(group.id, &uniq_key)? {
                        continue;
                    }
                    self.worker.process(group.id).await;
                }
            }
            GroupKind::Parallel => {
                let Some(pool) = &mut self.pool else {
                    return Ok(());
                };
                pool.reap();
                let spare = pool.spare_capacity();
                if spare == 0 {
                    tracing::debug!("pool full, skipping dispatch cycle");
                    return Ok(());
                }
                let pending = self.store.groups_by_kind_status(
                    GroupKind::Parallel,
                    GroupStatus::Pending,
                    Some(spare),
                )?;
                for group in pending {
                    pool.submit(&group, &uniq_key)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "performer_tests.rs"]
mod tests;
