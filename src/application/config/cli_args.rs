use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

/// Command-line arguments of the keyguard binary
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about)]
pub struct Args {
    /// The data directory that contains the key store. Defaults to the
    /// platform-specific data directory for keyguard.
    #[clap(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path of the key store file. Overrides the file inside `--data-dir`.
    ///
    /// The key store is a JSON array of key records, e.g.
    /// `[{"id": "k1", "type": "bip39", "encrypted": true, "hasPin": false}]`.
    #[clap(long, value_name = "FILE")]
    pub key_store: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Validate a derive-address request and print the derivation paths it
    /// asks for.
    DeriveAddress {
        /// JSON file holding the untrusted request.
        #[clap(long, value_name = "FILE")]
        request: PathBuf,
    },

    /// Read recovery words from stdin and print the detected phrase type.
    EnterWords,
}
