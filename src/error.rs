// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Failures of the local record store.
///
/// Unknown ids on update/delete are not errors; those operations return `Ok(false)`.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A mutation was rejected before anything was written.
    #[error("{0}")]
    Validation(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Stored document is corrupt: {0}")]
    CorruptDocument(String),

    /// An import file was rejected; the existing document is untouched.
    #[error("{0}")]
    InvalidImport(String),
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::StorageUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Failures talking to a remote blob store. Always recovered by the sync
/// coordinator; never surfaced as the failure of a local mutation.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote rejected credentials (HTTP {0})")]
    Unauthorized(u16),

    #[error("Remote returned HTTP {0}")]
    Status(u16),

    #[error("Malformed remote payload: {0}")]
    MalformedPayload(String),

    #[error("{0} is not supported by this transport")]
    Unsupported(&'static str),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
