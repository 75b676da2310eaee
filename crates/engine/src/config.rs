// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration, loaded from one TOML file shared by every
//! gantry process.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use uuid::Uuid;

use crate::error::EngineError;

/// Top-level configuration for all five daemons.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub env: EnvConfig,
    #[serde(default)]
    pub job: JobConfig,
    pub serial: ChannelConfig,
    pub parallel: ChannelConfig,
    #[serde(default)]
    pub observer: ObserverConfig,
}

/// `[env]` section: identity and store location.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvConfig {
    /// UUID scoping every store query. Daemons sharing a uniqkey share
    /// a job pool; anything enqueued under another key is invisible.
    pub uniqkey: String,
    /// Path to the SQLite database file.
    pub database: PathBuf,
}

/// `[job]` section: per-command execution limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// Wall-clock budget per command; 0 disables the timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Liveness poll cadence while a command runs, and the grace period
    /// between SIGTERM and SIGKILL on timeout.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Captured stdout/stderr are each truncated to this many bytes.
    #[serde(default = "default_output_limit_bytes")]
    pub output_limit_bytes: usize,
    /// LANG passed to every spawned command.
    #[serde(default = "default_env_lang")]
    pub env_lang: String,
    #[serde(default)]
    pub whitelist: WhitelistConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WhitelistConfig {
    #[serde(default)]
    pub enabled: bool,
    pub path: Option<PathBuf>,
}

/// `[serial]` / `[parallel]` section: one scheduler/performer pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelConfig {
    /// Named pipe the scheduler writes and the performer reads.
    pub fifo_path: PathBuf,
    #[serde(default = "default_start_code")]
    pub start_code: u8,
    #[serde(default = "default_stop_code")]
    pub stop_code: u8,
    #[serde(default = "default_ignore_code")]
    pub ignore_code: u8,
    /// Scheduler tick period.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Worker pool size; meaningful for `[parallel]` only, where it
    /// bounds concurrent group executions.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

/// `[observer]` section: supervision policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObserverConfig {
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    /// Restart budget shared across all supervised daemons.
    #[serde(default = "default_restart_count")]
    pub restart_count: u32,
    /// Budget exhausted after this long since the window opened resets
    /// the budget; sooner is a crash loop.
    #[serde(default = "default_restart_clear_secs")]
    pub restart_clear_secs: u64,
    /// `count/max` is written here whenever the budget changes.
    pub status_path: Option<PathBuf>,
    /// Directory for the child daemons' pidfiles.
    pub pidfile_dir: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
    3600
}
fn default_poll_interval_secs() -> u64 {
    10
}
fn default_output_limit_bytes() -> usize {
    64 * 1024
}
fn default_env_lang() -> String {
    "C".to_string()
}
fn default_start_code() -> u8 {
    b'0'
}
fn default_stop_code() -> u8 {
    b'9'
}
fn default_ignore_code() -> u8 {
    b'1'
}
fn default_interval_secs() -> u64 {
    10
}
fn default_pool_size() -> usize {
    10
}
fn default_check_interval_secs() -> u64 {
    10
}
fn default_restart_count() -> u32 {
    5
}
fn default_restart_clear_secs() -> u64 {
    60
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            output_limit_bytes: default_output_limit_bytes(),
            env_lang: default_env_lang(),
            whitelist: WhitelistConfig::default(),
        }
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval_secs(),
            restart_count: default_restart_count(),
            restart_clear_secs: default_restart_clear_secs(),
            status_path: None,
            pidfile_dir: None,
        }
    }
}

impl Config {
    /// Load and validate the configuration file. Any failure here is
    /// fatal at startup, before daemon logic begins.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
        let config: Config = toml::from_str(&raw)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        Uuid::parse_str(&self.env.uniqkey)
            .map_err(|e| EngineError::Config(format!("env.uniqkey is not a UUID: {e}")))?;
        if self.job.whitelist.enabled && self.job.whitelist.path.is_none() {
            return Err(EngineError::Config(
                "job.whitelist.enabled requires job.whitelist.path".to_string(),
            ));
        }
        self.serial.validate("serial")?;
        self.parallel.validate("parallel")?;
        if self.parallel.pool_size == 0 {
            return Err(EngineError::Config("parallel.pool_size must be >= 1".to_string()));
        }
        if self.observer.restart_count == 0 {
            return Err(EngineError::Config("observer.restart_count must be >= 1".to_string()));
        }
        Ok(())
    }

    pub fn channel(&self, kind: gantry_core::GroupKind) -> &ChannelConfig {
        match kind {
            gantry_core::GroupKind::Serial => &self.serial,
            gantry_core::GroupKind::Parallel => &self.parallel,
        }
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job.timeout_secs)
    }

    pub fn job_poll_interval(&self) -> Duration {
        Duration::from_secs(self.job.poll_interval_secs)
    }
}

impl ChannelConfig {
    fn validate(&self, section: &str) -> Result<(), EngineError> {
        let codes = [self.start_code, self.stop_code, self.ignore_code];
        if codes[0] == codes[1] || codes[0] == codes[2] || codes[1] == codes[2] {
            return Err(EngineError::Config(format!(
                "{section}: start/stop/ignore codes must be distinct (got {codes:?})"
            )));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
