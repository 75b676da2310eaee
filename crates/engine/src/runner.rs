// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded shell command execution.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::Instant;

use gantry_core::{split_command, JobId, JOB_ID_ENV};

use crate::config::Config;
use crate::error::EngineError;

/// Exit code reported when the child never produced one (timeout kill,
/// death by signal).
pub const SYNTHETIC_EXIT: i32 = -1;

const MIN_POLL: Duration = Duration::from_millis(10);

/// One command execution request.
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub command: String,
    /// Set when running a job's action or rollback; exported to the
    /// child as `GANTRY_JOB_ID` so it can report progress.
    pub job_id: Option<JobId>,
    pub lang: String,
    /// Wall-clock budget; zero disables the timeout.
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub output_limit: usize,
}

impl RunSpec {
    pub fn from_config(config: &Config, command: impl Into<String>, job_id: Option<JobId>) -> Self {
        Self {
            command: command.into(),
            job_id,
            lang: config.job.env_lang.clone(),
            timeout: config.job_timeout(),
            poll_interval: config.job_poll_interval(),
            output_limit: config.job.output_limit_bytes,
        }
    }
}

/// What a finished (or killed) command left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

/// Seam between the state machine and the operating system. The
/// whitelist gate sits in front of this trait, so implementations can
/// assume the command has already been admitted.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, spec: &RunSpec) -> Result<RunOutcome, EngineError>;
}

/// Production runner backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

#[async_trait]
impl ProcessRunner for ShellRunner {
    async fn run(&self, spec: &RunSpec) -> Result<RunOutcome, EngineError> {
        let argv = split_command(&spec.command);
        let Some((program, args)) = argv.split_first() else {
            return Err(EngineError::Spawn {
                command: spec.command.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            });
        };

        let mut cmd = Command::new(program);
        cmd.args(args)
            .env("LANG", &spec.lang)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(job_id) = spec.job_id {
            cmd.env(JOB_ID_ENV, job_id.to_string());
        }

        let mut child = cmd.spawn().map_err(|source| EngineError::Spawn {
            command: spec.command.clone(),
            source,
        })?;
        let pid = child.id();

        // Drain both pipes off-task so a chatty child never blocks on a
        // full pipe while we poll for exit.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = spec.output_limit;
        let out_task = tokio::spawn(read_capped(stdout, limit));
        let err_task = tokio::spawn(read_capped(stderr, limit));

        let poll = spec.poll_interval.max(MIN_POLL);
        let deadline = (!spec.timeout.is_zero()).then(|| Instant::now() + spec.timeout);

        let mut timed_out = false;
        let status = loop {
            if let Some(status) = child.try_wait().map_err(|source| EngineError::Spawn {
                command: spec.command.clone(),
                source,
            })? {
                break Some(status);
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                timed_out = true;
                break None;
            }
            tokio::time::sleep(poll).await;
        };

        let status = match status {
            Some(status) => Some(status),
            None => {
                tracing::warn!(command = %spec.command, timeout_secs = spec.timeout.as_secs(), "command timed out, terminating");
                if let Some(pid) = pid {
                    let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
                }
                match tokio::time::timeout(poll, child.wait()).await {
                    Ok(status) => status.ok(),
                    Err(_) => {
                        // SIGTERM ignored; no more grace.
                        let _ = child.start_kill();
                        child.wait().await.ok()
                    }
                }
            }
        };

        let (stdout, stdout_truncated) = join_capped(out_task).await;
        let (stderr, stderr_truncated) = join_capped(err_task).await;
        if stdout_truncated || stderr_truncated {
            tracing::info!(command = %spec.command, limit_bytes = limit, "command output truncated");
        }

        let exit_code = match status {
            Some(status) if !timed_out => status.code().unwrap_or(SYNTHETIC_EXIT),
            _ => SYNTHETIC_EXIT,
        };

        Ok(RunOutcome { exit_code, stdout, stderr, timed_out })
    }
}

/// Read a pipe to EOF, keeping at most `cap` bytes. Returns the capped
/// bytes (lossily decoded) and whether anything was dropped.
async fn read_capped<R>(reader: Option<R>, cap: usize) -> (String, bool)
where
    R: AsyncRead + Unpin + Send,
{
    let Some(mut reader) = reader else {
        return (String::new(), false);
    };
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 4096];
    let mut truncated = false;
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = cap.saturating_sub(buf.len());
                let take = n.min(room);
                buf.extend_from_slice(&chunk[..take]);
                if take < n {
                    truncated = true;
                }
            }
        }
    }
    (String::from_utf8_lossy(&buf).into_owned(), truncated)
}

async fn join_capped(task: tokio::task::JoinHandle<(String, bool)>) -> (String, bool) {
    task.await.unwrap_or_else(|_| (String::new(), false))
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
