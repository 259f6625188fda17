// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::key_files::write_key_pair;
use anyhow::Result;
use ppdag_config::AppConfig;
use std::path::PathBuf;
use tracing::info;

pub fn execute(config: &AppConfig, out: Option<PathBuf>) -> Result<()> {
    let out = match out {
        Some(out) => out,
        None => config.data_dir()?.join(&config.name).join("keys"),
    };

    let scheme = config.scheme.build(config.key_bits);
    info!(scheme = scheme.name(), bits = config.key_bits, "Generating key pair");
    let (pk, sk) = scheme.generate()?;

    let (public_path, private_path) = write_key_pair(&out, &pk, &sk)?;
    println!("public key:  {}", public_path.display());
    println!("private key: {}", private_path.display());
    Ok(())
}
