// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Canonical byte encodings for unsigned big integers.
//!
//! Integers travel through the ledger as two's-complement big-endian byte arrays (a leading
//! zero byte is present whenever the top bit of the magnitude is set) and, inside transaction
//! arguments, as standard base64 of those bytes.

use crate::{PaillierError, PaillierResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use num_bigint::{BigInt, BigUint, Sign};

/// Encode a non-negative integer as a two's-complement big-endian byte array.
pub fn to_canonical_bytes(value: &BigUint) -> Vec<u8> {
    BigInt::from_biguint(Sign::Plus, value.clone()).to_signed_bytes_be()
}

/// Decode a two's-complement big-endian byte array, rejecting empty input and negative values.
pub fn from_canonical_bytes(bytes: &[u8]) -> PaillierResult<BigUint> {
    if bytes.is_empty() {
        return Err(PaillierError::Malformed("empty integer encoding".to_string()));
    }
    BigInt::from_signed_bytes_be(bytes)
        .to_biguint()
        .ok_or_else(|| PaillierError::Malformed("negative integer encoding".to_string()))
}

pub fn to_base64(value: &BigUint) -> String {
    STANDARD.encode(to_canonical_bytes(value))
}

pub fn from_base64(encoded: &str) -> PaillierResult<BigUint> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| PaillierError::Malformed(format!("invalid base64: {e}")))?;
    from_canonical_bytes(&bytes)
}

/// Lower case hex without leading zeros, the form used by the key interchange format.
pub(crate) fn to_hex(value: &BigUint) -> String {
    value.to_str_radix(16)
}

pub(crate) fn from_hex(encoded: &str) -> PaillierResult<BigUint> {
    let encoded = encoded.trim();
    if encoded.is_empty() || !encoded.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(PaillierError::Malformed(format!(
            "'{encoded}' is not a hex integer"
        )));
    }
    BigUint::parse_bytes(encoded.as_bytes(), 16)
        .ok_or_else(|| PaillierError::Malformed(format!("'{encoded}' is not a hex integer")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_bit_values_get_a_sign_byte() {
        let value = BigUint::from(0x80u32);
        assert_eq!(to_canonical_bytes(&value), vec![0x00, 0x80]);
        assert_eq!(to_canonical_bytes(&BigUint::from(0x7fu32)), vec![0x7f]);
        assert_eq!(to_canonical_bytes(&BigUint::from(0u32)), vec![0x00]);
    }

    #[test]
    fn negative_encodings_are_rejected() {
        assert!(matches!(
            from_canonical_bytes(&[0xff]),
            Err(PaillierError::Malformed(_))
        ));
        assert!(matches!(
            from_canonical_bytes(&[]),
            Err(PaillierError::Malformed(_))
        ));
    }

    #[test]
    fn base64_matches_signed_byte_convention() {
        // 300 = 0x012c
        assert_eq!(to_base64(&BigUint::from(300u32)), "ASw=");
        assert_eq!(from_base64("ASw=").unwrap(), BigUint::from(300u32));
        assert!(from_base64("not base64!").is_err());
    }

    #[test]
    fn hex_parsing_is_strict() {
        assert_eq!(from_hex("ff").unwrap(), BigUint::from(255u32));
        assert!(from_hex("").is_err());
        assert!(from_hex("0xff").is_err());
        assert!(from_hex("-1").is_err());
    }
}
