// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::key_files::read_public_key;
use anyhow::Result;
use num_bigint::BigUint;
use ppdag_config::AppConfig;
use std::path::Path;

pub fn execute(config: &AppConfig, public_key: &Path, value: &BigUint) -> Result<()> {
    let pk = read_public_key(public_key)?;
    let scheme = config.scheme.build(config.key_bits);
    let ciphertext = scheme.encrypt(value, &pk)?;
    println!("{}", ciphertext.to_base64());
    Ok(())
}
