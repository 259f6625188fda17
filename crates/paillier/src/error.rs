// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;

/// Errors raised by the Paillier engine.
///
/// None of these are retryable: a malformed cryptographic input stays malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaillierError {
    /// Key generation was asked for parameters that cannot produce a sound key.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A plaintext or ciphertext lies outside the domain of the key.
    #[error("Value out of range: {0}")]
    Range(String),

    /// Ciphertexts or totals that do not share the same modulus.
    #[error("Incompatible key: {0}")]
    IncompatibleKey(String),

    /// Key or ciphertext material could not be parsed.
    #[error("Malformed encoding: {0}")]
    Malformed(String),
}

pub type PaillierResult<T> = Result<T, PaillierError>;
