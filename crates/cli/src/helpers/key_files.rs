// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{Context, Result};
use ppdag_paillier::{PrivateKey, PublicKey};
use std::{
    fs::{self, OpenOptions, Permissions},
    io::Write,
    os::unix::fs::{OpenOptionsExt, PermissionsExt},
    path::{Path, PathBuf},
};
use tracing::debug;
use zeroize::Zeroizing;

pub const PUBLIC_KEY_FILE: &str = "paillier.pub";
pub const PRIVATE_KEY_FILE: &str = "paillier.key";

fn write_new(path: &Path, contents: &[u8], mode: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
        .with_context(|| format!("Failed to create keyfile {}", path.display()))?;
    file.write_all(contents)
        .context("Failed to write data to keyfile")?;
    file.flush().context("Failed to flush data to keyfile")?;
    drop(file);

    fs::set_permissions(path, Permissions::from_mode(mode))
        .context("Failed to set permissions on keyfile")?;
    debug!(path = %path.display(), "Keyfile written");
    Ok(())
}

/// Write both halves of a key pair into `dir`. Existing key files are never overwritten.
pub fn write_key_pair(dir: &Path, pk: &PublicKey, sk: &PrivateKey) -> Result<(PathBuf, PathBuf)> {
    let public_path = dir.join(PUBLIC_KEY_FILE);
    let private_path = dir.join(PRIVATE_KEY_FILE);
    write_new(&public_path, pk.to_text().as_bytes(), 0o644)?;
    // private key is readable by the owner only
    write_new(&private_path, sk.to_text().as_bytes(), 0o400)?;
    Ok((public_path, private_path))
}

pub fn read_public_key(path: &Path) -> Result<PublicKey> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Could not read public key {}", path.display()))?;
    PublicKey::from_text(&text)
        .with_context(|| format!("Could not parse public key {}", path.display()))
}

pub fn read_private_key(path: &Path) -> Result<PrivateKey> {
    let text = Zeroizing::new(
        fs::read_to_string(path)
            .with_context(|| format!("Could not read private key {}", path.display()))?,
    );
    PrivateKey::from_text(&text)
        .with_context(|| format!("Could not parse private key {}", path.display()))
}
