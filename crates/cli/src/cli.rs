// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::path::PathBuf;

use crate::helpers::telemetry::setup_simple_tracing;
use crate::{decrypt, demo, encrypt, keygen};
use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use num_bigint::BigUint;
use ppdag_config::{load_config, AppConfig, CliOverrides};
use tracing::{info, instrument, Level};

#[derive(Parser, Debug)]
#[command(name = "ppdag")]
#[command(about = "Privacy-preserving data aggregation: sum secret values on a ledger with Paillier encryption", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate error levels by adding additional `-v` arguments. Eg. `ppdag -vvv` will give you
    /// trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,

    /// Bit length of the modulus for generated keys
    #[arg(long = "key-bits", global = true)]
    pub key_bits: Option<u64>,

    /// Aggregator whose running total is used
    #[arg(long = "aggregator-id", global = true)]
    pub aggregator_id: Option<String>,

    /// Folder for keys and ledger data
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn execute(self) -> Result<()> {
        setup_simple_tracing(self.log_level());
        let config = self.load_config()?;
        info!("Config loaded from: {:?}", config.config_file);

        match self.command {
            Commands::Keygen { out } => keygen::execute(&config, out)?,
            Commands::Encrypt { public_key, value } => {
                encrypt::execute(&config, &public_key, &value)?
            }
            Commands::Decrypt {
                private_key,
                ciphertext,
            } => decrypt::execute(&config, &private_key, &ciphertext)?,
            Commands::Demo {
                public_key,
                private_key,
                values,
            } => {
                let keys = public_key.zip(private_key);
                demo::execute(&config, keys, values).await?
            }
        }

        Ok(())
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        load_config(
            self.config.as_deref(),
            CliOverrides {
                key_bits: self.key_bits,
                aggregator_id: self.aggregator_id.clone(),
                data_dir: self.data_dir.clone(),
            },
        )
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a key pair and write it to `paillier.pub` and `paillier.key`
    Keygen {
        /// Output folder. Defaults to `<data_dir>/<name>/keys`
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Encrypt a non-negative integer and print the ciphertext as base64
    Encrypt {
        #[arg(long = "public-key")]
        public_key: PathBuf,

        value: BigUint,
    },

    /// Decrypt a base64 ciphertext and print the plaintext
    Decrypt {
        #[arg(long = "private-key")]
        private_key: PathBuf,

        ciphertext: String,
    },

    /// Run an aggregation on a local ledger and print each decrypted total
    Demo {
        /// Use this public key instead of generating a fresh pair
        #[arg(long = "public-key", requires = "private_key")]
        public_key: Option<PathBuf>,

        #[arg(long = "private-key", requires = "public_key")]
        private_key: Option<PathBuf>,

        /// Values to contribute, one transaction each
        #[arg(default_values = ["100", "200", "50"])]
        values: Vec<BigUint>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn demo_defaults_to_the_org3_values() {
        let cli = Cli::parse_from(["ppdag", "-v", "demo"]);
        assert_eq!(cli.log_level(), Level::INFO);
        let Commands::Demo { values, public_key, .. } = cli.command else {
            panic!("expected demo");
        };
        assert_eq!(public_key, None);
        assert_eq!(
            values,
            vec![
                BigUint::from(100u32),
                BigUint::from(200u32),
                BigUint::from(50u32)
            ]
        );
    }

    #[test]
    fn demo_key_files_come_in_pairs() {
        let result = Cli::try_parse_from(["ppdag", "demo", "--public-key", "k.pub"]);
        assert!(result.is_err());
    }
}
