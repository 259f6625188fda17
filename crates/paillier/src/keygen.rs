// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::cipher::l_function;
use crate::{PaillierError, PaillierResult, PrivateKey, PublicKey};
use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_prime::nt_funcs::is_prime;
use num_prime::PrimalityTestConfig;
use num_traits::One;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::debug;

/// Smallest modulus size accepted by [`KeyGenerator::generate`].
pub const MIN_MODULUS_BITS: u64 = 512;

/// Produces Paillier key pairs.
pub struct KeyGenerator;

impl KeyGenerator {
    /// Generate a key pair whose modulus is exactly `bits` long, using the operating system RNG.
    pub fn generate(bits: u64) -> PaillierResult<(PublicKey, PrivateKey)> {
        Self::generate_with_rng(bits, &mut OsRng)
    }

    /// Generate a key pair with the given RNG.
    ///
    /// p and q are drawn independently with their two top bits set so that `n = pq` has exactly
    /// `bits` bits.
    pub fn generate_with_rng<R: RngCore + CryptoRng>(
        bits: u64,
        rng: &mut R,
    ) -> PaillierResult<(PublicKey, PrivateKey)> {
        if bits < MIN_MODULUS_BITS {
            return Err(PaillierError::InvalidParameter(format!(
                "modulus of {bits} bits is below the minimum of {MIN_MODULUS_BITS} bits"
            )));
        }
        let p_bits = bits / 2;
        let q_bits = bits - p_bits;

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let p = random_prime(p_bits, rng);
            let q = random_prime(q_bits, rng);
            if p == q || !coprime_with_totient(&p, &q) {
                continue;
            }
            debug!(bits, attempts, "generated paillier primes");
            return build_key_pair(&p, &q);
        }
    }

    /// Build a key pair from caller supplied primes.
    ///
    /// Intended for fixtures: the minimum modulus size is not enforced here, but both values
    /// must be prime, distinct and satisfy `gcd(pq, (p-1)(q-1)) = 1`.
    pub fn from_primes(p: &BigUint, q: &BigUint) -> PaillierResult<(PublicKey, PrivateKey)> {
        if p == q {
            return Err(PaillierError::InvalidParameter(
                "p and q must be distinct".to_string(),
            ));
        }
        for candidate in [p, q] {
            if !is_probable_prime(candidate) {
                return Err(PaillierError::InvalidParameter(format!(
                    "{candidate} is not prime"
                )));
            }
        }
        if !coprime_with_totient(p, q) {
            return Err(PaillierError::InvalidParameter(
                "gcd(pq, (p-1)(q-1)) must be 1".to_string(),
            ));
        }
        build_key_pair(p, q)
    }
}

fn build_key_pair(p: &BigUint, q: &BigUint) -> PaillierResult<(PublicKey, PrivateKey)> {
    let one = BigUint::one();
    let n = p * q;
    let public_key = PublicKey::from_modulus(n.clone())?;

    let lambda = (p - &one).lcm(&(q - &one));
    let u = public_key.g().modpow(&lambda, public_key.n_squared());
    let mu = l_function(&u, &n).modinv(&n).ok_or_else(|| {
        PaillierError::InvalidParameter("L(g^lambda) is not invertible mod n".to_string())
    })?;

    let private_key = PrivateKey::new(lambda, mu, n)?;
    Ok((public_key, private_key))
}

fn coprime_with_totient(p: &BigUint, q: &BigUint) -> bool {
    let one = BigUint::one();
    let n = p * q;
    let phi = (p - &one) * (q - &one);
    n.gcd(&phi).is_one()
}

fn random_prime<R: RngCore + CryptoRng>(bits: u64, rng: &mut R) -> BigUint {
    let top_bits = (BigUint::one() << (bits - 1)) | (BigUint::one() << (bits - 2));
    loop {
        let candidate = rng.gen_biguint(bits) | &top_bits | BigUint::one();
        if is_probable_prime(&candidate) {
            return candidate;
        }
    }
}

fn is_probable_prime(candidate: &BigUint) -> bool {
    is_prime(candidate, Some(PrimalityTestConfig::strict())).probably()
}
