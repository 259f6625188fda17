// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::protocol::{self, ops};
use crate::{AggregationError, AggregationResult, ErrorKind};
use num_bigint::BigUint;
use ppdag_ledger::{Chaincode, ChaincodeError, ChaincodeResult, TxContext};
use ppdag_paillier::{encoding, Ciphertext};
use serde::Serialize;
use tracing::warn;

/// Ledger contract exposing the aggregation protocol.
///
/// Arguments are UTF-8 strings; big integers are base64 of their two's complement big-endian
/// bytes. Argument layouts:
///
/// | operation         | arguments                                   |
/// |-------------------|---------------------------------------------|
/// | `initialize`      | id, affiliation (may be empty), n² (may be empty) |
/// | `contribute`      | id, ciphertext, n²                          |
/// | `dataAggregation` | id, n², ciphertext...                       |
/// | `currentTotal`    | id                                          |
/// | `account`         | id                                          |
/// | `history`         | id                                          |
#[derive(Clone, Copy, Debug, Default)]
pub struct AggregationChaincode;

struct Args<'a> {
    args: &'a [Vec<u8>],
    id: String,
    op: &'a str,
}

impl<'a> Args<'a> {
    fn parse(op: &'a str, args: &'a [Vec<u8>]) -> AggregationResult<Self> {
        let id = match args.first() {
            Some(bytes) => std::str::from_utf8(bytes)
                .map_err(|_| {
                    AggregationError::new(
                        ErrorKind::InvalidParameter,
                        "",
                        op,
                        "aggregator id is not valid UTF-8",
                    )
                })?
                .to_string(),
            None => {
                return Err(AggregationError::new(
                    ErrorKind::InvalidParameter,
                    "",
                    op,
                    "missing aggregator id",
                ))
            }
        };
        Ok(Self { args, id, op })
    }

    fn invalid(&self, message: impl Into<String>) -> AggregationError {
        AggregationError::new(ErrorKind::InvalidParameter, &self.id, self.op, message)
    }

    fn expect_len(&self, len: usize) -> AggregationResult<()> {
        if self.args.len() != len {
            return Err(self.invalid(format!(
                "expected {len} arguments, got {}",
                self.args.len()
            )));
        }
        Ok(())
    }

    fn text(&self, index: usize) -> AggregationResult<&'a str> {
        let bytes = self
            .args
            .get(index)
            .ok_or_else(|| self.invalid(format!("missing argument {index}")))?;
        std::str::from_utf8(bytes).map_err(|_| self.invalid(format!("argument {index} is not UTF-8")))
    }

    fn optional_text(&self, index: usize) -> AggregationResult<Option<&'a str>> {
        match self.args.get(index) {
            None => Ok(None),
            Some(_) => Ok(Some(self.text(index)?).filter(|s| !s.is_empty())),
        }
    }

    fn big(&self, index: usize) -> AggregationResult<BigUint> {
        encoding::from_base64(self.text(index)?)
            .map_err(|e| AggregationError::from_paillier(e, &self.id, self.op))
    }

    fn ciphertext(&self, index: usize) -> AggregationResult<Ciphertext> {
        Ciphertext::from_base64(self.text(index)?)
            .map_err(|e| AggregationError::from_paillier(e, &self.id, self.op))
    }
}

fn json<T: Serialize>(value: &T, args: &Args<'_>) -> AggregationResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| args.invalid(e.to_string()))
}

impl AggregationChaincode {
    fn dispatch(
        &self,
        ctx: &mut TxContext<'_>,
        operation: &str,
        raw: &[Vec<u8>],
    ) -> AggregationResult<Vec<u8>> {
        let args = Args::parse(operation, raw)?;
        let id = args.id.as_str();
        match operation {
            ops::INITIALIZE => {
                if raw.len() > 3 {
                    return Err(args.invalid("expected at most 3 arguments"));
                }
                let affiliation = args.optional_text(1)?.map(str::to_string);
                let modulus = match args.optional_text(2)? {
                    Some(_) => Some(args.big(2)?),
                    None => None,
                };
                let account = protocol::initialize(ctx, id, affiliation, modulus)?;
                json(&account, &args)
            }
            ops::CONTRIBUTE => {
                args.expect_len(3)?;
                let ciphertext = args.ciphertext(1)?;
                let modulus = args.big(2)?;
                let account = protocol::contribute(ctx, id, &ciphertext, &modulus)?;
                json(&account, &args)
            }
            ops::CONTRIBUTE_ALL => {
                if raw.len() < 3 {
                    return Err(args.invalid("expected an id, n² and at least one ciphertext"));
                }
                let modulus = args.big(1)?;
                let ciphertexts = (2..raw.len())
                    .map(|i| args.ciphertext(i))
                    .collect::<AggregationResult<Vec<_>>>()?;
                let account = protocol::contribute_all(ctx, id, &ciphertexts, &modulus)?;
                json(&account, &args)
            }
            ops::CURRENT_TOTAL => {
                args.expect_len(1)?;
                Ok(protocol::current_total(ctx, id)?.to_bytes())
            }
            ops::ACCOUNT => {
                args.expect_len(1)?;
                json(&protocol::account(ctx, id)?, &args)
            }
            ops::HISTORY => {
                args.expect_len(1)?;
                json(&protocol::history(ctx, id)?, &args)
            }
            _ => Err(args.invalid("unimplemented method")),
        }
    }
}

impl Chaincode for AggregationChaincode {
    fn invoke(&self, ctx: &mut TxContext<'_>, operation: &str, args: &[Vec<u8>]) -> ChaincodeResult {
        self.dispatch(ctx, operation, args).map_err(|err| {
            warn!(
                tx_id = ctx.tx_id(),
                kind = %err.kind,
                aggregator_id = %err.aggregator_id,
                operation = %err.operation,
                "{}",
                err.message
            );
            ChaincodeError::from(err)
        })
    }
}
