// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::key_files::read_private_key;
use anyhow::{Context, Result};
use ppdag_config::AppConfig;
use ppdag_paillier::Ciphertext;
use std::path::Path;

pub fn execute(config: &AppConfig, private_key: &Path, ciphertext: &str) -> Result<()> {
    let sk = read_private_key(private_key)?;
    let ciphertext =
        Ciphertext::from_base64(ciphertext.trim()).context("Ciphertext is not valid base64")?;
    let scheme = config.scheme.build(config.key_bits);
    println!("{}", scheme.decrypt(&ciphertext, &sk)?);
    Ok(())
}
