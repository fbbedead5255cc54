// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Failures reported by the ledger store, the chart layouts and the importer.
///
/// None of these are fatal: a failed operation leaves the ledger as it was and
/// fires no change notification.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("no ledger database is open")]
    NotConnected,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),
    #[error("precondition failed: {0}")]
    Precondition(String),
    #[error("import source error: {0}")]
    Source(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        LedgerError::Validation(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        LedgerError::Precondition(msg.into())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
