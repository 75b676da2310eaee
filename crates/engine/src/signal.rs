// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler-to-performer signalling over a named pipe.
//!
//! A FIFO is a single-slot rendezvous: the scheduler's write blocks
//! until the performer opens the read end, so stale ticks never queue
//! up while the performer is busy.

use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use nix::sys::stat::Mode;
use nix::unistd::mkfifo;

use crate::error::EngineError;

const FIFO_MODE: Mode = Mode::from_bits_truncate(0o660);

#[derive(Debug, Clone)]
pub struct SignalChannel {
    path: PathBuf,
}

impl SignalChannel {
    /// Make sure the pipe exists at `path`, creating it if missing and
    /// replacing anything that is not a FIFO. Both ends call this at
    /// startup; whichever comes first wins.
    pub fn ensure(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref().to_path_buf();
        match std::fs::metadata(&path) {
            Ok(meta) if meta.file_type().is_fifo() => {}
            Ok(_) => {
                tracing::warn!(path = %path.display(), "replacing non-fifo file with named pipe");
                std::fs::remove_file(&path).map_err(|e| EngineError::io(&path, e))?;
                mkfifo(&path, FIFO_MODE)
                    .map_err(|e| EngineError::Signal(format!("mkfifo {}: {e}", path.display())))?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                mkfifo(&path, FIFO_MODE)
                    .map_err(|e| EngineError::Signal(format!("mkfifo {}: {e}", path.display())))?;
            }
            Err(e) => return Err(EngineError::io(&path, e)),
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one code byte. Blocks (off the async runtime) until a
    /// reader has the other end open.
    pub async fn send(&self, code: u8) -> Result<(), EngineError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), EngineError> {
            let mut fifo = OpenOptions::new()
                .write(true)
                .open(&path)
                .map_err(|e| EngineError::io(&path, e))?;
            fifo.write_all(&[code]).map_err(|e| EngineError::io(&path, e))
        })
        .await
        .map_err(|e| EngineError::Signal(format!("send task failed: {e}")))?
    }

    /// Block until one code byte arrives. A writer that opens and
    /// closes without writing produces EOF, which is retried.
    pub async fn recv(&self) -> Result<u8, EngineError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<u8, EngineError> {
            loop {
                let mut fifo = OpenOptions::new()
                    .read(true)
                    .open(&path)
                    .map_err(|e| EngineError::io(&path, e))?;
                let mut byte = [0u8; 1];
                match fifo.read(&mut byte) {
                    Ok(0) => continue,
                    Ok(_) => return Ok(byte[0]),
                    Err(e) => return Err(EngineError::io(&path, e)),
                }
            }
        })
        .await
        .map_err(|e| EngineError::Signal(format!("recv task failed: {e}")))?
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
