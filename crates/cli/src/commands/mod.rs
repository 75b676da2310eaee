// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod enqueue;
pub mod observer;
pub mod performer;
pub mod progress;
pub mod scheduler;
