// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use num_bigint::BigUint;
use ppdag_paillier::{KeyGenerator, PrivateKey, PublicKey};

/// Small fixed key pair (n of about 40 bits). Fast and deterministic; far below the size any
/// real deployment accepts.
pub fn fixture_keys() -> Result<(PublicKey, PrivateKey)> {
    Ok(KeyGenerator::from_primes(
        &BigUint::from(1_000_003u32),
        &BigUint::from(1_000_033u32),
    )?)
}

/// A second, unrelated fixture key pair.
pub fn other_fixture_keys() -> Result<(PublicKey, PrivateKey)> {
    Ok(KeyGenerator::from_primes(
        &BigUint::from(1_000_037u32),
        &BigUint::from(1_000_039u32),
    )?)
}

/// Route log output of the code under test through the test harness.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
