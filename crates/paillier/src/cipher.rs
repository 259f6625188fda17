// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Ciphertext, PaillierError, PaillierResult, PrivateKey, PublicKey};
use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::One;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

/// `L(x) = (x - 1) / n` using integer division.
pub(crate) fn l_function(x: &BigUint, n: &BigUint) -> BigUint {
    (x - 1u32) / n
}

/// Encrypt `plaintext` under `pk` with fresh randomness from the operating system RNG.
///
/// Every call draws a new `r`, so encrypting the same value twice yields different ciphertexts.
pub fn encrypt(plaintext: &BigUint, pk: &PublicKey) -> PaillierResult<Ciphertext> {
    encrypt_with_rng(plaintext, pk, &mut OsRng)
}

/// Encrypt with a caller supplied cryptographically secure RNG.
///
/// Computes `c = g^m * r^n mod n²` for `r` uniform in `[1, n)` with `gcd(r, n) = 1`.
pub fn encrypt_with_rng<R: RngCore + CryptoRng>(
    plaintext: &BigUint,
    pk: &PublicKey,
    rng: &mut R,
) -> PaillierResult<Ciphertext> {
    if plaintext >= pk.n() {
        return Err(PaillierError::Range(format!(
            "plaintext must be smaller than the {} bit modulus",
            pk.bits()
        )));
    }
    let n_squared = pk.n_squared();
    let r = sample_unit(pk.n(), rng);
    let gm = pk.g().modpow(plaintext, n_squared);
    let rn = r.modpow(pk.n(), n_squared);
    Ok(Ciphertext::from((gm * rn) % n_squared))
}

/// Recover the plaintext of `ciphertext`: `m = L(c^lambda mod n²) * mu mod n`.
pub fn decrypt(ciphertext: &Ciphertext, sk: &PrivateKey) -> PaillierResult<BigUint> {
    let c = ciphertext.as_biguint();
    let n_squared = sk.n_squared();
    if c >= n_squared {
        return Err(PaillierError::Range(
            "ciphertext is not smaller than n^2".to_string(),
        ));
    }
    if !c.gcd(n_squared).is_one() {
        return Err(PaillierError::Range(
            "ciphertext is not a unit modulo n^2".to_string(),
        ));
    }
    let u = c.modpow(sk.lambda(), n_squared);
    Ok((l_function(&u, sk.n()) * sk.mu()) % sk.n())
}

fn sample_unit<R: RngCore + CryptoRng>(n: &BigUint, rng: &mut R) -> BigUint {
    let one = BigUint::one();
    loop {
        let r = rng.gen_biguint_range(&one, n);
        if r.gcd(n).is_one() {
            return r;
        }
    }
}
