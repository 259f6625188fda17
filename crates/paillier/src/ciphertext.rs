// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::encoding::{from_base64, from_canonical_bytes, to_base64, to_canonical_bytes};
use crate::PaillierResult;
use num_bigint::BigUint;
use num_traits::One;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A Paillier ciphertext, an integer in `[0, n²)` for the key it was produced under.
///
/// The ciphertext does not carry its modulus. Callers pass the modulus to every operation so a
/// mismatch is caught by range checks rather than hidden inside the value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ciphertext(BigUint);

impl Ciphertext {
    /// The neutral element of ciphertext combination, a valid encryption of zero (`r = 1`)
    /// under every key.
    pub fn identity() -> Self {
        Self(BigUint::one())
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// Two's-complement big-endian bytes, the form carried in ledger state and event payloads.
    pub fn to_bytes(&self) -> Vec<u8> {
        to_canonical_bytes(&self.0)
    }

    pub fn from_bytes(bytes: &[u8]) -> PaillierResult<Self> {
        Ok(Self(from_canonical_bytes(bytes)?))
    }

    pub fn to_base64(&self) -> String {
        to_base64(&self.0)
    }

    pub fn from_base64(encoded: &str) -> PaillierResult<Self> {
        Ok(Self(from_base64(encoded)?))
    }
}

impl From<BigUint> for Ciphertext {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ciphertext({})", self.to_base64())
    }
}

impl fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl Serialize for Ciphertext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Ciphertext {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64(&encoded).map_err(de::Error::custom)
    }
}
