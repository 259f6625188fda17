// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Homomorphic addition of ciphertexts.
//!
//! Multiplying two ciphertexts modulo `n²` yields an encryption of the sum of their plaintexts
//! modulo `n`. Sums that reach `n` wrap around: this is a property of the cryptosystem, so
//! callers must pick a modulus large enough for the totals they expect.

use crate::{Ciphertext, PaillierError, PaillierResult};
use num_bigint::BigUint;

/// Combine two ciphertexts produced under the key with modulus `n`.
pub fn combine(c1: &Ciphertext, c2: &Ciphertext, n: &BigUint) -> PaillierResult<Ciphertext> {
    combine_mod_n_squared(c1, c2, &(n * n))
}

/// Combine two ciphertexts when the caller already holds `n²`.
pub fn combine_mod_n_squared(
    c1: &Ciphertext,
    c2: &Ciphertext,
    n_squared: &BigUint,
) -> PaillierResult<Ciphertext> {
    ensure_in_domain(c1, n_squared)?;
    ensure_in_domain(c2, n_squared)?;
    Ok(Ciphertext::from(
        (c1.as_biguint() * c2.as_biguint()) % n_squared,
    ))
}

/// Fold any number of ciphertexts into one, starting from [`Ciphertext::identity`].
///
/// The fold is sequential; since combination is associative and commutative any other
/// topology gives the same value.
pub fn combine_all<'a, I>(ciphertexts: I, n: &BigUint) -> PaillierResult<Ciphertext>
where
    I: IntoIterator<Item = &'a Ciphertext>,
{
    let n_squared = n * n;
    ciphertexts
        .into_iter()
        .try_fold(Ciphertext::identity(), |acc, c| {
            combine_mod_n_squared(&acc, c, &n_squared)
        })
}

/// Reject a ciphertext that could not have been produced under a key with this `n²`.
pub fn ensure_in_domain(c: &Ciphertext, n_squared: &BigUint) -> PaillierResult<()> {
    if c.as_biguint() >= n_squared {
        return Err(PaillierError::IncompatibleKey(
            "ciphertext is not smaller than the modulus squared".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decrypt, encrypt, KeyGenerator, PrivateKey, PublicKey};
    use proptest::prelude::*;

    fn fixture() -> (PublicKey, PrivateKey) {
        KeyGenerator::from_primes(&BigUint::from(1_000_003u64), &BigUint::from(1_000_033u64))
            .unwrap()
    }

    #[test]
    fn combined_ciphertexts_decrypt_to_the_sum() {
        let (pk, sk) = fixture();
        let a = encrypt(&BigUint::from(100u32), &pk).unwrap();
        let b = encrypt(&BigUint::from(200u32), &pk).unwrap();
        let sum = combine(&a, &b, pk.n()).unwrap();
        assert_eq!(decrypt(&sum, &sk).unwrap(), BigUint::from(300u32));
    }

    #[test]
    fn sums_wrap_modulo_n() {
        let (pk, sk) = fixture();
        let m1 = pk.n() - 5u32;
        let m2 = BigUint::from(8u32);
        let sum = combine(
            &encrypt(&m1, &pk).unwrap(),
            &encrypt(&m2, &pk).unwrap(),
            pk.n(),
        )
        .unwrap();
        assert_eq!(decrypt(&sum, &sk).unwrap(), BigUint::from(3u32));
    }

    #[test]
    fn mismatched_modulus_is_incompatible() {
        let (pk, _) = fixture();
        let (other, _) =
            KeyGenerator::from_primes(&BigUint::from(7u32), &BigUint::from(11u32)).unwrap();
        let c = encrypt(&BigUint::from(1u32), &pk).unwrap();
        let big = Ciphertext::from(pk.n_squared() - 1u32);
        assert!(matches!(
            combine(&big, &Ciphertext::identity(), other.n()),
            Err(PaillierError::IncompatibleKey(_))
        ));
        assert!(matches!(
            combine(&Ciphertext::identity(), &Ciphertext::from(pk.n_squared().clone()), pk.n()),
            Err(PaillierError::IncompatibleKey(_))
        ));
        assert!(combine(&c, &c, pk.n()).is_ok());
    }

    #[test]
    fn combine_all_folds_any_number_of_ciphertexts() {
        let (pk, sk) = fixture();
        let values = [3u32, 5, 7, 11, 13];
        let ciphertexts: Vec<_> = values
            .iter()
            .map(|v| encrypt(&BigUint::from(*v), &pk).unwrap())
            .collect();
        let total = combine_all(&ciphertexts, pk.n()).unwrap();
        assert_eq!(decrypt(&total, &sk).unwrap(), BigUint::from(39u32));
        assert_eq!(
            combine_all(std::iter::empty(), pk.n()).unwrap(),
            Ciphertext::identity()
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn combination_is_homomorphic(m1 in 0u64..500_000_000_000, m2 in 0u64..500_000_000_000) {
            let (pk, sk) = fixture();
            let sum = combine(
                &encrypt(&BigUint::from(m1), &pk).unwrap(),
                &encrypt(&BigUint::from(m2), &pk).unwrap(),
                pk.n(),
            ).unwrap();
            prop_assert_eq!(decrypt(&sum, &sk).unwrap(), BigUint::from(m1 + m2));
        }

        #[test]
        fn combination_is_associative_and_commutative(a in 1u64.., b in 1u64.., c in 1u64..) {
            let (pk, _) = fixture();
            let n2 = pk.n_squared();
            let a = Ciphertext::from(BigUint::from(a) % n2);
            let b = Ciphertext::from(BigUint::from(b) % n2);
            let c = Ciphertext::from(BigUint::from(c) % n2);
            let n = pk.n();

            let left = combine(&combine(&a, &b, n).unwrap(), &c, n).unwrap();
            let right = combine(&a, &combine(&b, &c, n).unwrap(), n).unwrap();
            prop_assert_eq!(left, right);
            prop_assert_eq!(combine(&a, &b, n).unwrap(), combine(&b, &a, n).unwrap());
        }
    }
}
