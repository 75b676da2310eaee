// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A persisted row carries an encoding this build does not know.
    #[error("corrupt {column} value {value:?} in row {id}")]
    CorruptRow {
        column: &'static str,
        value: String,
        id: u64,
    },
}
