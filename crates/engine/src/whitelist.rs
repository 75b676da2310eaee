// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command whitelist gate.
//!
//! Only the first shell token of a command is checked, matched exactly
//! against the lines of the whitelist file. The file is re-read on
//! every check, so an edit takes effect on the next job without a
//! daemon restart. A rejection is a job status, never an error.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use gantry_core::split_command;

use crate::config::WhitelistConfig;
use crate::error::EngineError;

#[derive(Debug, Clone)]
pub struct Whitelist {
    /// `None` means the gate is disabled and every command is admitted.
    path: Option<PathBuf>,
}

impl Whitelist {
    /// Gate that admits everything.
    pub fn allow_all() -> Self {
        Self { path: None }
    }

    /// Gate backed by the file at `path`: one literal command name per
    /// trimmed line, blank lines skipped. No globbing, no comment
    /// syntax. The file must be readable now; later checks re-read it.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let path = path.into();
        read_names(&path)?;
        Ok(Self { path: Some(path) })
    }

    pub fn from_config(config: &WhitelistConfig) -> Result<Self, EngineError> {
        if !config.enabled {
            return Ok(Self::allow_all());
        }
        match &config.path {
            Some(path) => Self::load(path),
            None => Err(EngineError::Config(
                "job.whitelist.enabled requires job.whitelist.path".to_string(),
            )),
        }
    }

    /// Whether the first token of `command` is admitted. An empty
    /// command has no token to admit. If the file has become
    /// unreadable since startup the gate fails closed.
    pub fn permits(&self, command: &str) -> bool {
        let Some(path) = &self.path else {
            return true;
        };
        let allowed = match read_names(path) {
            Ok(names) => names,
            Err(error) => {
                tracing::warn!(%error, "whitelist unreadable, rejecting command");
                return false;
            }
        };
        split_command(command)
            .first()
            .is_some_and(|name| allowed.contains(name))
    }
}

fn read_names(path: &Path) -> Result<HashSet<String>, EngineError> {
    let raw = std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
#[path = "whitelist_tests.rs"]
mod tests;
