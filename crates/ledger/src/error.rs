// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a contract while executing a proposal.
///
/// `code` is a stable machine readable kind chosen by the contract so that clients on the
/// other side of the submitter can rebuild a typed error.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ChaincodeError {
    pub code: String,
    pub message: String,
}

impl ChaincodeError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The transaction read state that another transaction changed before it could commit.
    /// Nothing was written and no event was emitted; re-submitting re-reads fresh state.
    #[error("Transaction read stale state for key '{key}'")]
    Conflict { key: String },

    /// The contract rejected the proposal.
    #[error("Transaction rejected: {0}")]
    Rejected(ChaincodeError),

    /// The backing store failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Read-set conflicts and store failures may succeed on a second attempt. A rejection is
    /// final because the contract would reject the same proposal again.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Conflict { .. } | LedgerError::Storage(_))
    }
}

impl From<sled::Error> for LedgerError {
    fn from(value: sled::Error) -> Self {
        LedgerError::Storage(value.to_string())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rejections_are_final() {
        assert!(LedgerError::Conflict { key: "k".into() }.is_transient());
        assert!(LedgerError::Storage("io".into()).is_transient());
        assert!(!LedgerError::Rejected(ChaincodeError::new("NotFound", "gone")).is_transient());
    }
}
