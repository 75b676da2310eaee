// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler daemon: ticks the performer over the signal channel.

use std::time::Duration;

use crate::config::ChannelConfig;
use crate::error::EngineError;
use crate::signal::SignalChannel;

pub struct Scheduler {
    channel: SignalChannel,
    start_code: u8,
    interval: Duration,
}

impl Scheduler {
    pub fn new(config: &ChannelConfig) -> Result<Self, EngineError> {
        Ok(Self {
            channel: SignalChannel::ensure(&config.fifo_path)?,
            start_code: config.start_code,
            interval: config.interval(),
        })
    }

    /// Send one start code. Blocks until the performer reads it.
    pub async fn tick(&self) -> Result<(), EngineError> {
        self.channel.send(self.start_code).await?;
        tracing::debug!(code = self.start_code, "sent start signal");
        Ok(())
    }

    /// Tick forever at the configured interval. The write side of the
    /// channel is the pacing element: while the performer is busy, the
    /// scheduler waits instead of queueing signals.
    pub async fn run(&self) -> Result<(), EngineError> {
        loop {
            self.tick().await?;
            tokio::time::sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
