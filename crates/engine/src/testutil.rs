// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::config::{ChannelConfig, Config, EnvConfig, JobConfig, ObserverConfig, WhitelistConfig};
use crate::error::EngineError;
use crate::runner::{ProcessRunner, RunOutcome, RunSpec};

pub(crate) const TEST_KEY: &str = "2f9f31f4-9f0c-4cbe-9f5a-0a3f5a1d2b4c";

pub(crate) fn test_config(dir: &Path) -> Config {
    Config {
        env: EnvConfig {
            uniqkey: TEST_KEY.to_string(),
            database: dir.join("gantry.db"),
        },
        job: JobConfig {
            timeout_secs: 5,
            poll_interval_secs: 0,
            output_limit_bytes: 64 * 1024,
            env_lang: "C".to_string(),
            whitelist: WhitelistConfig::default(),
        },
        serial: ChannelConfig {
            fifo_path: dir.join("serial.fifo"),
            start_code: b'0',
            stop_code: b'9',
            ignore_code: b'1',
            interval_secs: 1,
            pool_size: 1,
        },
        parallel: ChannelConfig {
            fifo_path: dir.join("parallel.fifo"),
            start_code: b'0',
            stop_code: b'9',
            ignore_code: b'1',
            interval_secs: 1,
            pool_size: 3,
        },
        observer: ObserverConfig::default(),
    }
}

/// Runner that records instead of spawning. Commands listed in
/// `fail_on` report exit 1.
#[derive(Clone, Default)]
pub(crate) struct FakeRunner {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_on: Arc<Mutex<HashSet<String>>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, command: &str) {
        self.fail_on.lock().insert(command.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn run(&self, spec: &RunSpec) -> Result<RunOutcome, EngineError> {
        self.calls.lock().push(spec.command.clone());
        let failed = self.fail_on.lock().contains(&spec.command);
        Ok(RunOutcome {
            exit_code: i32::from(failed),
            stdout: String::new(),
            stderr: if failed { "boom\n".to_string() } else { String::new() },
            timed_out: false,
        })
    }
}
