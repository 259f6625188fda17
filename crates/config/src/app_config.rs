// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::load_config::{find_in_parent, resolve_config_path};
use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use ppdag_paillier::{SchemeKind, MIN_MODULUS_BITS};
use serde::{Deserialize, Serialize};
use std::{
    env,
    path::{Path, PathBuf},
};

pub const DEFAULT_CONFIG_NAME: &str = "ppdag.config.yaml";
pub const ENV_PREFIX: &str = "PPDAG_";

/// Where the ledger keeps its world state.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum StoreConfig {
    #[default]
    InMem,
    Sled {
        /// Defaults to `<data_dir>/<name>/db`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Name of this deployment, used for the ledger name and the default data folder
    pub name: String,
    pub scheme: SchemeKind,
    /// Bit length of the modulus n for newly generated keys
    pub key_bits: u64,
    pub aggregator_id: String,
    pub affiliation: Option<String>,
    pub store: StoreConfig,
    /// How many times a submission that lost a read conflict is re-submitted
    pub max_retries: u32,
    pub data_dir: Option<PathBuf>,
    /// The file this configuration was read from, if any
    #[serde(default, skip_serializing)]
    pub config_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "ppdag".to_string(),
            scheme: SchemeKind::default(),
            key_bits: 2048,
            aggregator_id: "Org3".to_string(),
            affiliation: None,
            store: StoreConfig::default(),
            max_retries: 5,
            data_dir: None,
            config_file: None,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.key_bits < MIN_MODULUS_BITS {
            bail!(
                "key_bits must be at least {MIN_MODULUS_BITS}, got {}",
                self.key_bits
            );
        }
        if self.aggregator_id.trim().is_empty() {
            bail!("aggregator_id must not be empty");
        }
        if self.name.trim().is_empty() {
            bail!("name must not be empty");
        }
        Ok(())
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => OsDirs::data_dir(),
        }
    }

    /// Folder of the sled database, or `None` for the in-memory store.
    pub fn db_path(&self) -> Result<Option<PathBuf>> {
        match &self.store {
            StoreConfig::InMem => Ok(None),
            StoreConfig::Sled { path: Some(path) } => Ok(Some(path.clone())),
            StoreConfig::Sled { path: None } => {
                Ok(Some(self.data_dir()?.join(&self.name).join("db")))
            }
        }
    }

    pub fn use_in_mem_store(&self) -> bool {
        matches!(self.store, StoreConfig::InMem)
    }
}

/// Values passed on the command line. Only the ones that are set override the other layers.
#[derive(Default, Serialize, Deserialize, Clone, Debug)]
pub struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_bits: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregator_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

/// Load the configuration: defaults, then the YAML file (`config_file` or the nearest
/// `ppdag.config.yaml`), then `PPDAG_` environment variables, then CLI overrides.
pub fn load_config(config_file: Option<&Path>, overrides: CliOverrides) -> Result<AppConfig> {
    let cwd = env::current_dir().context("Could not read the current directory")?;
    let resolved = resolve_config_path(find_in_parent, &cwd, DEFAULT_CONFIG_NAME, config_file);

    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
    if let Some(path) = &resolved {
        if !path.is_file() {
            bail!("Configuration file not found: {}", path.display());
        }
        figment = figment.merge(Yaml::file(path));
    }

    let mut config: AppConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .merge(Serialized::defaults(overrides))
        .extract()
        .context("Could not parse configuration")?;
    config.config_file = resolved;
    config.validate()?;
    Ok(config)
}

pub struct OsDirs;
impl OsDirs {
    pub fn data_dir() -> Result<PathBuf> {
        Ok(dirs::data_local_dir()
            .context("No local data directory on this platform; set data_dir explicitly")?
            .join("ppdag"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_| {
            let config = load_config(None, CliOverrides::default()).map_err(|e| e.to_string())?;
            assert_eq!(config, AppConfig::default());
            assert_eq!(config.key_bits, 2048);
            assert_eq!(config.aggregator_id, "Org3");
            assert!(config.use_in_mem_store());
            assert_eq!(config.db_path().map_err(|e| e.to_string())?, None);
            Ok(())
        });
    }

    #[test]
    fn test_file_env_and_cli_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_NAME,
                r#"
name: "org3-node"
key_bits: 1024
aggregator_id: "Org9"
affiliation: "BJ"
store:
  type: sled
  path: "/var/lib/ppdag/db"
"#,
            )?;
            jail.set_env("PPDAG_AGGREGATOR_ID", "Org5");
            jail.set_env("PPDAG_MAX_RETRIES", "9");

            let config = load_config(
                None,
                CliOverrides {
                    key_bits: Some(3072),
                    ..Default::default()
                },
            )
            .map_err(|e| e.to_string())?;

            assert_eq!(config.name, "org3-node");
            assert_eq!(config.key_bits, 3072);
            assert_eq!(config.aggregator_id, "Org5");
            assert_eq!(config.max_retries, 9);
            assert_eq!(config.affiliation.as_deref(), Some("BJ"));
            assert_eq!(
                config.db_path().map_err(|e| e.to_string())?,
                Some(PathBuf::from("/var/lib/ppdag/db"))
            );
            assert!(config.config_file.is_some());
            Ok(())
        });
    }

    #[test]
    fn test_sled_path_defaults_under_data_dir() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "custom.yaml",
                r#"
name: "node"
data_dir: "/data"
store:
  type: sled
"#,
            )?;
            let config = load_config(Some(Path::new("custom.yaml")), CliOverrides::default())
                .map_err(|e| e.to_string())?;
            assert_eq!(
                config.db_path().map_err(|e| e.to_string())?,
                Some(PathBuf::from("/data/node/db"))
            );
            Ok(())
        });
    }

    #[test]
    fn test_rejects_small_keys() {
        Jail::expect_with(|jail| {
            jail.set_env("PPDAG_KEY_BITS", "256");
            let Err(err) = load_config(None, CliOverrides::default()) else {
                return Err("expected a validation error".into());
            };
            assert!(err.to_string().contains("key_bits"));
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() -> Result<()> {
        let Err(err) = load_config(Some(Path::new("/nope/ppdag.yaml")), CliOverrides::default())
        else {
            bail!("error expected");
        };
        assert!(err.to_string().contains("not found"));
        Ok(())
    }
}
