// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use ppdag_ledger::{ChaincodeError, LedgerError};
use ppdag_paillier::PaillierError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};
use thiserror::Error;

/// Kind of an aggregation failure. The string form travels through the ledger as the
/// contract error code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum ErrorKind {
    InvalidParameter,
    Range,
    IncompatibleKey,
    NotFound,
    AlreadyInitialized,
    /// The ledger could not apply the transaction right now. The only retryable kind.
    TransientStore,
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("{operation} for aggregator '{aggregator_id}' failed with {kind}: {message}")]
pub struct AggregationError {
    pub kind: ErrorKind,
    pub aggregator_id: String,
    pub operation: String,
    pub message: String,
}

impl AggregationError {
    pub fn new(
        kind: ErrorKind,
        aggregator_id: &str,
        operation: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            aggregator_id: aggregator_id.to_string(),
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn from_paillier(err: PaillierError, aggregator_id: &str, operation: &str) -> Self {
        let kind = match err {
            PaillierError::InvalidParameter(_) | PaillierError::Malformed(_) => {
                ErrorKind::InvalidParameter
            }
            PaillierError::Range(_) => ErrorKind::Range,
            PaillierError::IncompatibleKey(_) => ErrorKind::IncompatibleKey,
        };
        Self::new(kind, aggregator_id, operation, err.to_string())
    }

    /// Rebuild a typed error from what the ledger reported for a submission.
    pub fn from_ledger(err: LedgerError, aggregator_id: &str, operation: &str) -> Self {
        match err {
            LedgerError::Rejected(rejection) => {
                let kind =
                    ErrorKind::from_str(&rejection.code).unwrap_or(ErrorKind::InvalidParameter);
                Self::new(kind, aggregator_id, operation, rejection.message)
            }
            err @ (LedgerError::Conflict { .. } | LedgerError::Storage(_)) => Self::new(
                ErrorKind::TransientStore,
                aggregator_id,
                operation,
                err.to_string(),
            ),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == ErrorKind::TransientStore
    }
}

impl From<AggregationError> for ChaincodeError {
    fn from(value: AggregationError) -> Self {
        ChaincodeError::new(value.kind.to_string(), value.message)
    }
}

pub type AggregationResult<T> = Result<T, AggregationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_survives_the_ledger() {
        let err = AggregationError::new(ErrorKind::NotFound, "Org3", "contribute", "missing");
        let ledger_err = LedgerError::Rejected(err.clone().into());
        assert_eq!(
            AggregationError::from_ledger(ledger_err, "Org3", "contribute"),
            err
        );
    }

    #[test]
    fn conflicts_are_transient() {
        let err = AggregationError::from_ledger(
            LedgerError::Conflict {
                key: "aggregator/Org3".to_string(),
            },
            "Org3",
            "contribute",
        );
        assert!(err.is_transient());
        assert!(!AggregationError::from_paillier(
            PaillierError::Range("too big".to_string()),
            "Org3",
            "encrypt"
        )
        .is_transient());
    }

    #[test]
    fn unknown_codes_are_not_retried() {
        let err = AggregationError::from_ledger(
            LedgerError::Rejected(ChaincodeError::new("Weird", "?")),
            "Org3",
            "contribute",
        );
        assert_eq!(err.kind, ErrorKind::InvalidParameter);
    }
}
