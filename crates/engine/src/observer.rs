// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observer daemon: supervises the scheduler/performer processes.
//!
//! Four children share one restart budget. Exhausting the budget within
//! the clear window is a crash loop and ends supervision; exhausting it
//! after the window simply resets the budget.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::process::{Child, Command};

use gantry_core::Clock;

use crate::config::Config;
use crate::error::EngineError;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// The four daemons under supervision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonRole {
    SerialScheduler,
    SerialPerformer,
    ParallelScheduler,
    ParallelPerformer,
}

impl DaemonRole {
    pub const ALL: [DaemonRole; 4] = [
        DaemonRole::SerialScheduler,
        DaemonRole::SerialPerformer,
        DaemonRole::ParallelScheduler,
        DaemonRole::ParallelPerformer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DaemonRole::SerialScheduler => "serial-scheduler",
            DaemonRole::SerialPerformer => "serial-performer",
            DaemonRole::ParallelScheduler => "parallel-scheduler",
            DaemonRole::ParallelPerformer => "parallel-performer",
        }
    }

    fn subcommand(self) -> &'static str {
        match self {
            DaemonRole::SerialScheduler | DaemonRole::ParallelScheduler => "scheduler",
            DaemonRole::SerialPerformer | DaemonRole::ParallelPerformer => "performer",
        }
    }

    fn mode(self) -> &'static str {
        match self {
            DaemonRole::SerialScheduler | DaemonRole::SerialPerformer => "serial",
            DaemonRole::ParallelScheduler | DaemonRole::ParallelPerformer => "parallel",
        }
    }
}

impl std::fmt::Display for DaemonRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared restart budget with a crash-loop detector.
///
/// Every crash spends one restart. Spending the last one is a crash
/// loop if the window opened less than `clear` ago, otherwise the
/// budget refills and the window restarts.
pub struct RestartBudget<C: Clock> {
    remaining: u32,
    max: u32,
    clear: Duration,
    window_start: Instant,
    clock: C,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetDecision {
    Restart,
    CrashLoop,
}

impl<C: Clock> RestartBudget<C> {
    pub fn new(max: u32, clear: Duration, clock: C) -> Self {
        let window_start = clock.now();
        Self { remaining: max, max, clear, window_start, clock }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn on_crash(&mut self) -> BudgetDecision {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return BudgetDecision::Restart;
        }
        let elapsed = self.clock.now().duration_since(self.window_start);
        if elapsed < self.clear {
            return BudgetDecision::CrashLoop;
        }
        self.remaining = self.max;
        self.window_start = self.clock.now();
        BudgetDecision::Restart
    }
}

/// Why supervision ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverOutcome {
    /// Restart budget exhausted inside the clear window.
    CrashLoop,
}

struct Supervised {
    role: DaemonRole,
    child: Child,
}

pub struct Observer<C: Clock> {
    config: Arc<Config>,
    config_path: PathBuf,
    budget: RestartBudget<C>,
    children: Vec<Supervised>,
}

impl<C: Clock> Observer<C> {
    pub fn new(config: Arc<Config>, config_path: impl Into<PathBuf>, clock: C) -> Self {
        let budget = RestartBudget::new(
            config.observer.restart_count,
            Duration::from_secs(config.observer.restart_clear_secs),
            clock,
        );
        Self { config, config_path: config_path.into(), budget, children: Vec::new() }
    }

    /// Launch all four daemons and supervise until a crash loop.
    pub async fn run(&mut self) -> Result<ObserverOutcome, EngineError> {
        for role in DaemonRole::ALL {
            let child = self.spawn(role)?;
            tracing::info!(role = %role, pid = child.id(), "daemon started");
            self.children.push(Supervised { role, child });
        }
        self.write_status();

        let check_interval = Duration::from_secs(self.config.observer.check_interval_secs);
        loop {
            tokio::time::sleep(check_interval).await;
            if let Some(outcome) = self.check_children()? {
                return Ok(outcome);
            }
        }
    }

    /// One supervision pass: restart whatever died, or report the
    /// crash loop.
    fn check_children(&mut self) -> Result<Option<ObserverOutcome>, EngineError> {
        for index in 0..self.children.len() {
            let (role, exited) = {
                let supervised = &mut self.children[index];
                let exited = supervised.child.try_wait().map_err(|source| EngineError::Spawn {
                    command: supervised.role.name().to_string(),
                    source,
                })?;
                (supervised.role, exited)
            };
            let Some(status) = exited else {
                continue;
            };

            tracing::warn!(role = %role, %status, "daemon exited");
            let decision = self.budget.on_crash();
            self.write_status();
            match decision {
                BudgetDecision::CrashLoop => {
                    tracing::error!(
                        role = %role,
                        max_restarts = self.budget.max(),
                        clear_secs = self.config.observer.restart_clear_secs,
                        "crash loop detected, giving up"
                    );
                    return Ok(Some(ObserverOutcome::CrashLoop));
                }
                BudgetDecision::Restart => {
                    let old_pid = self.children[index].child.id();
                    let child = self.spawn(role)?;
                    tracing::info!(
                        role = %role,
                        ?old_pid,
                        new_pid = child.id(),
                        restarts_left = self.budget.remaining(),
                        "daemon restarted"
                    );
                    self.children[index].child = child;
                }
            }
        }
        Ok(None)
    }

    fn spawn(&self, role: DaemonRole) -> Result<Child, EngineError> {
        let exe = std::env::current_exe()
            .map_err(|source| EngineError::Spawn { command: role.name().to_string(), source })?;
        let mut cmd = Command::new(exe);
        cmd.arg(role.subcommand())
            .args(["--mode", role.mode()])
            .arg("--config")
            .arg(&self.config_path)
            .kill_on_drop(true);
        if let Some(dir) = &self.config.observer.pidfile_dir {
            cmd.arg("--pidfile").arg(dir.join(format!("{}.pid", role.name())));
        }
        cmd.spawn()
            .map_err(|source| EngineError::Spawn { command: role.name().to_string(), source })
    }

    /// SIGTERM every still-running child, then reap them. Called on
    /// every exit path so no daemon outlives its observer.
    pub async fn shutdown(&mut self) {
        for supervised in &self.children {
            if let Some(pid) = supervised.child.id() {
                tracing::info!(role = %supervised.role, pid, "stopping daemon");
                let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            }
        }
        for supervised in &mut self.children {
            match tokio::time::timeout(SHUTDOWN_GRACE, supervised.child.wait()).await {
                Ok(_) => {}
                Err(_) => {
                    let _ = supervised.child.start_kill();
                    let _ = supervised.child.wait().await;
                }
            }
        }
        self.children.clear();
    }

    /// Persist `remaining/max` for out-of-band monitoring.
    fn write_status(&self) {
        let Some(path) = &self.config.observer.status_path else {
            return;
        };
        let line = format!("{}/{}\n", self.budget.remaining(), self.budget.max());
        if let Err(error) = write_status_file(path, &line) {
            tracing::warn!(path = %path.display(), %error, "failed to write status file");
        }
    }
}

fn write_status_file(path: &Path, line: &str) -> std::io::Result<()> {
    std::fs::write(path, line)
}

#[cfg(test)]
#[path = "observer_tests.rs"]
mod tests;
