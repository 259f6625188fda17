// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod cipher;
mod ciphertext;
mod combiner;
pub mod encoding;
mod error;
mod keygen;
mod keys;
mod scheme;

pub use cipher::{decrypt, encrypt, encrypt_with_rng};
pub use ciphertext::Ciphertext;
pub use combiner::{combine, combine_all, combine_mod_n_squared, ensure_in_domain};
pub use error::*;
pub use keygen::{KeyGenerator, MIN_MODULUS_BITS};
pub use keys::{PrivateKey, PublicKey};
pub use scheme::{AdditiveScheme, Paillier, SchemeKind};
