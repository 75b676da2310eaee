// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gantry-core: data model for the gantry job orchestrator.

pub mod macros;

pub mod clock;
pub mod command;
pub mod group;
pub mod id;
pub mod job;

pub use clock::{Clock, FakeClock, SystemClock};
pub use command::split_command;
pub use group::{GroupKind, GroupStatus, JobGroup, NewGroup, NewJob};
pub use id::{GroupId, JobId, JOB_ID_ENV};
pub use job::{clamped_progress, Job, JobStatus, MAX_PROGRESS};
