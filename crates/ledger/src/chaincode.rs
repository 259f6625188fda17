// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{ChaincodeError, TxContext};
use serde::{Deserialize, Serialize};

pub type ChaincodeResult = Result<Vec<u8>, ChaincodeError>;

/// A named operation with byte-string arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub operation: String,
    pub args: Vec<Vec<u8>>,
}

impl Proposal {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            args: vec![],
        }
    }

    pub fn arg(mut self, arg: impl Into<Vec<u8>>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Contract logic executed by the ledger for every proposal.
///
/// `invoke` must only touch state through the context so the ledger can validate and commit
/// the transaction as a unit.
pub trait Chaincode: Send + Sync + 'static {
    fn invoke(&self, ctx: &mut TxContext<'_>, operation: &str, args: &[Vec<u8>])
        -> ChaincodeResult;
}
