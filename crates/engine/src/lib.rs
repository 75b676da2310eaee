// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gantry-engine: job execution, dispatch loops, and supervision.
//!
//! The engine is split along process boundaries: each scheduler and
//! performer runs as its own daemon, all sharing one [`gantry_store`]
//! database and signalling each other over named pipes. The observer
//! supervises the other four.

pub mod config;
pub mod error;
pub mod observer;
pub mod performer;
pub mod pool;
pub mod runner;
pub mod scheduler;
pub mod signal;
pub mod whitelist;
pub mod worker;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::Config;
pub use error::EngineError;
pub use observer::{Observer, ObserverOutcome};
pub use performer::{Performer, PerformerExit};
pub use pool::WorkerPool;
pub use runner::{ProcessRunner, RunOutcome, RunSpec, ShellRunner};
pub use scheduler::Scheduler;
pub use signal::SignalChannel;
pub use whitelist::Whitelist;
pub use worker::GroupWorker;
