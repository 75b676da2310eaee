// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded worker pool for parallel group execution.
//!
//! A slot is taken only after the group is atomically claimed
//! (pending to running) in the store, so a group id can never be
//! dispatched twice even with competing performers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::task::JoinSet;

use gantry_core::{GroupId, GroupStatus, JobGroup};
use gantry_store::JobStore;

use crate::error::EngineError;
use crate::runner::ProcessRunner;
use crate::worker::GroupWorker;

pub struct WorkerPool<R> {
    worker: Arc<GroupWorker<R>>,
    store: Arc<dyn JobStore>,
    capacity: usize,
    claimed: AtomicUsize,
    tasks: JoinSet<GroupId>,
    in_flight: HashMap<tokio::task::Id, GroupId>,
}

impl<R: ProcessRunner + Send + Sync + 'static> WorkerPool<R> {
    pub fn new(worker: Arc<GroupWorker<R>>, store: Arc<dyn JobStore>, capacity: usize) -> Self {
        Self {
            worker,
            store,
            capacity,
            claimed: AtomicUsize::new(0),
            tasks: JoinSet::new(),
            in_flight: HashMap::new(),
        }
    }

    /// Slots currently free. The dispatcher asks for at most this many
    /// pending groups per cycle.
    pub fn spare_capacity(&self) -> usize {
        self.capacity.saturating_sub(self.claimed.load(Ordering::SeqCst))
    }

    /// Claim the group and spawn a worker for it. Returns false without
    /// side effects when the pool is full, and false after the claim
    /// lost (group no longer pending, e.g. another performer took it).
    pub fn submit(&mut self, group: &JobGroup, uniq_key: &str) -> Result<bool, EngineError> {
        if self.spare_capacity() == 0 {
            return Ok(false);
        }
        if !self.store.claim_group(group.id, uniq_key)? {
            tracing::debug!(group_id = %group.id, "claim lost, group already taken");
            return Ok(false);
        }
        self.claimed.fetch_add(1, Ordering::SeqCst);
        let worker = Arc::clone(&self.worker);
        let group_id = group.id;
        let handle = self.tasks.spawn(async move {
            worker.process(group_id).await;
            group_id
        });
        self.in_flight.insert(handle.id(), group_id);
        Ok(true)
    }

    /// Collect finished workers and free their slots. A panicked worker
    /// leaves its group stuck Running, so it is force-marked AppError.
    pub fn reap(&mut self) -> usize {
        let mut freed = 0;
        while let Some(result) = self.tasks.try_join_next_with_id() {
            self.finish_one(result);
            freed += 1;
        }
        freed
    }

    /// Wait for every in-flight worker to finish, freeing all slots.
    pub async fn drain(&mut self) {
        while let Some(result) = self.tasks.join_next_with_id().await {
            self.finish_one(result);
        }
    }

    fn finish_one(
        &mut self,
        result: Result<(tokio::task::Id, GroupId), tokio::task::JoinError>,
    ) {
        self.claimed.fetch_sub(1, Ordering::SeqCst);
        match result {
            Ok((task_id, _group_id)) => {
                self.in_flight.remove(&task_id);
            }
            Err(join_error) => {
                let group_id = self.in_flight.remove(&join_error.id());
                tracing::error!(?group_id, %join_error, "worker task failed");
                if let Some(group_id) = group_id {
                    if let Err(error) =
                        self.store.update_group_status(group_id, GroupStatus::AppError)
                    {
                        tracing::error!(%group_id, %error, "failed to record app_error status");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
