// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{cipher, combiner, Ciphertext, KeyGenerator, PaillierResult, PrivateKey, PublicKey};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Capability interface of an additively homomorphic cryptosystem.
///
/// Applications receive an implementation through configuration and hold it as
/// `Arc<dyn AdditiveScheme>` instead of looking one up from a global registry.
pub trait AdditiveScheme: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn generate(&self) -> PaillierResult<(PublicKey, PrivateKey)>;

    fn encrypt(&self, plaintext: &BigUint, pk: &PublicKey) -> PaillierResult<Ciphertext>;

    fn decrypt(&self, ciphertext: &Ciphertext, sk: &PrivateKey) -> PaillierResult<BigUint>;

    fn combine(
        &self,
        c1: &Ciphertext,
        c2: &Ciphertext,
        pk: &PublicKey,
    ) -> PaillierResult<Ciphertext>;
}

/// The Paillier cryptosystem with `g = n + 1`.
#[derive(Debug, Clone)]
pub struct Paillier {
    key_bits: u64,
}

impl Paillier {
    pub fn new(key_bits: u64) -> Self {
        Self { key_bits }
    }
}

impl AdditiveScheme for Paillier {
    fn name(&self) -> &'static str {
        "paillier"
    }

    fn generate(&self) -> PaillierResult<(PublicKey, PrivateKey)> {
        KeyGenerator::generate(self.key_bits)
    }

    fn encrypt(&self, plaintext: &BigUint, pk: &PublicKey) -> PaillierResult<Ciphertext> {
        cipher::encrypt(plaintext, pk)
    }

    fn decrypt(&self, ciphertext: &Ciphertext, sk: &PrivateKey) -> PaillierResult<BigUint> {
        cipher::decrypt(ciphertext, sk)
    }

    fn combine(
        &self,
        c1: &Ciphertext,
        c2: &Ciphertext,
        pk: &PublicKey,
    ) -> PaillierResult<Ciphertext> {
        combiner::combine_mod_n_squared(c1, c2, pk.n_squared())
    }
}

/// Selects the cryptosystem an application runs with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemeKind {
    #[default]
    Paillier,
}

impl SchemeKind {
    /// Instantiate the selected scheme.
    pub fn build(self, key_bits: u64) -> Arc<dyn AdditiveScheme> {
        match self {
            SchemeKind::Paillier => Arc::new(Paillier::new(key_bits)),
        }
    }
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemeKind::Paillier => write!(f, "paillier"),
        }
    }
}
