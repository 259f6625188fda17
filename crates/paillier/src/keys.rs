// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::encoding::{from_hex, to_hex};
use crate::{PaillierError, PaillierResult};
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

const PUBLIC_KEY_HEADER: &str = "PPDAG-PAILLIER-PUBLIC-KEY v1";
const PRIVATE_KEY_HEADER: &str = "PPDAG-PAILLIER-PRIVATE-KEY v1";

/// Paillier public key `(n, g)`.
///
/// `n²` is derived once on construction since every encryption and combination needs it.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    n: BigUint,
    g: BigUint,
    n_squared: BigUint,
}

impl PublicKey {
    /// Build a public key from its components.
    ///
    /// Rejects a modulus that is too small to hold two primes and a generator that is not a
    /// unit modulo `n²`.
    pub fn new(n: BigUint, g: BigUint) -> PaillierResult<Self> {
        if n < BigUint::from(6u32) {
            return Err(PaillierError::InvalidParameter(format!(
                "modulus {n} cannot be a product of two distinct primes"
            )));
        }
        let n_squared = &n * &n;
        if g.is_zero() || g >= n_squared || !g.gcd(&n_squared).is_one() {
            return Err(PaillierError::InvalidParameter(
                "generator g must be invertible modulo n^2".to_string(),
            ));
        }
        Ok(Self { n, g, n_squared })
    }

    /// Public key using the standard generator `g = n + 1`.
    pub fn from_modulus(n: BigUint) -> PaillierResult<Self> {
        let g = &n + 1u32;
        Self::new(n, g)
    }

    pub fn n(&self) -> &BigUint {
        &self.n
    }

    pub fn g(&self) -> &BigUint {
        &self.g
    }

    pub fn n_squared(&self) -> &BigUint {
        &self.n_squared
    }

    /// Size of the modulus in bits.
    pub fn bits(&self) -> u64 {
        self.n.bits()
    }

    /// True when the private key was generated together with this public key.
    pub fn pairs_with(&self, sk: &PrivateKey) -> bool {
        self.n == sk.n
    }

    /// Tagged-field text form, see [`PublicKey::from_text`].
    pub fn to_text(&self) -> String {
        format!(
            "{PUBLIC_KEY_HEADER}\nn={}\ng={}\n",
            to_hex(&self.n),
            to_hex(&self.g)
        )
    }

    /// Parse the tagged-field text form:
    ///
    /// ```text
    /// PPDAG-PAILLIER-PUBLIC-KEY v1
    /// n=<hex>
    /// g=<hex>
    /// ```
    pub fn from_text(text: &str) -> PaillierResult<Self> {
        let mut fields = parse_tagged(text, PUBLIC_KEY_HEADER, &["n", "g"])?;
        let n = take_field(&mut fields, "n")?;
        let g = take_field(&mut fields, "g")?;
        Self::new(n, g)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("bits", &self.bits())
            .field("n", &to_hex(&self.n))
            .finish()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl FromStr for PublicKey {
    type Err = PaillierError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_text(s)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_text(&text).map_err(de::Error::custom)
    }
}

/// Paillier private key `(lambda, mu)` together with the modulus it belongs to.
///
/// Held only by the aggregator. It has no `Display` or `Serialize`
/// implementation; export goes through [`PrivateKey::to_text`] which returns a zeroizing buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
    lambda: BigUint,
    mu: BigUint,
    n: BigUint,
    n_squared: BigUint,
}

impl PrivateKey {
    pub fn new(lambda: BigUint, mu: BigUint, n: BigUint) -> PaillierResult<Self> {
        if n < BigUint::from(6u32) {
            return Err(PaillierError::InvalidParameter(format!(
                "modulus {n} cannot be a product of two distinct primes"
            )));
        }
        if lambda.is_zero() {
            return Err(PaillierError::InvalidParameter(
                "lambda must be positive".to_string(),
            ));
        }
        if mu.is_zero() || mu >= n {
            return Err(PaillierError::InvalidParameter(
                "mu must lie in [1, n)".to_string(),
            ));
        }
        let n_squared = &n * &n;
        Ok(Self {
            lambda,
            mu,
            n,
            n_squared,
        })
    }

    pub fn lambda(&self) -> &BigUint {
        &self.lambda
    }

    pub fn mu(&self) -> &BigUint {
        &self.mu
    }

    pub fn n(&self) -> &BigUint {
        &self.n
    }

    pub fn n_squared(&self) -> &BigUint {
        &self.n_squared
    }

    pub fn to_text(&self) -> Zeroizing<String> {
        Zeroizing::new(format!(
            "{PRIVATE_KEY_HEADER}\nn={}\nlambda={}\nmu={}\n",
            to_hex(&self.n),
            to_hex(&self.lambda),
            to_hex(&self.mu)
        ))
    }

    pub fn from_text(text: &str) -> PaillierResult<Self> {
        let mut fields = parse_tagged(text, PRIVATE_KEY_HEADER, &["n", "lambda", "mu"])?;
        let n = take_field(&mut fields, "n")?;
        let lambda = take_field(&mut fields, "lambda")?;
        let mu = take_field(&mut fields, "mu")?;
        Self::new(lambda, mu, n)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("n", &to_hex(&self.n))
            .field("lambda", &"<redacted>")
            .field("mu", &"<redacted>")
            .finish()
    }
}

impl FromStr for PrivateKey {
    type Err = PaillierError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_text(s)
    }
}

/// Parse `header` followed by `tag=hex` lines. Every expected tag must appear exactly once and
/// nothing else may appear. Blank lines are ignored.
fn parse_tagged(
    text: &str,
    header: &str,
    expected: &[&str],
) -> PaillierResult<BTreeMap<String, BigUint>> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    match lines.next() {
        Some(first) if first == header => {}
        Some(first) => {
            return Err(PaillierError::Malformed(format!(
                "expected header '{header}' but found '{first}'"
            )))
        }
        None => return Err(PaillierError::Malformed("empty key text".to_string())),
    }

    let mut fields = BTreeMap::new();
    for line in lines {
        let Some((tag, value)) = line.split_once('=') else {
            return Err(PaillierError::Malformed(format!(
                "line '{line}' is not a tag=value pair"
            )));
        };
        let tag = tag.trim();
        if !expected.contains(&tag) {
            return Err(PaillierError::Malformed(format!("unknown tag '{tag}'")));
        }
        if fields.insert(tag.to_string(), from_hex(value)?).is_some() {
            return Err(PaillierError::Malformed(format!("duplicate tag '{tag}'")));
        }
    }
    Ok(fields)
}

fn take_field(fields: &mut BTreeMap<String, BigUint>, tag: &str) -> PaillierResult<BigUint> {
    fields
        .remove(tag)
        .ok_or_else(|| PaillierError::Malformed(format!("missing tag '{tag}'")))
}
