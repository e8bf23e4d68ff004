//! nativestart - package JVM applications behind a native launcher
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
//!
//! The `nativestart` binary drives the packer from a `nativestart.toml`
//! project file:
//!
//! ```text
//! nativestart init Demo                 # write a template configuration
//! nativestart keygen                    # nativestart.key / nativestart.pub
//! nativestart descriptor --key-file nativestart.key
//! nativestart executable --stubs stubs --public-key nativestart.pub
//! ```

pub mod cmd;
pub mod config;
pub mod keyfile;

use clap::{Args, Parser, Subcommand};
use nativestart_packer::schema::{HashAlgorithm, OperatingSystem};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "nativestart")]
#[command(author, version, about = "Package JVM applications behind a native launcher")]
pub struct Cli {
    /// Project configuration file
    #[arg(short, long, global = true, default_value = config::CONFIG_FILE)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a template configuration file
    Init {
        /// Application name
        name: String,
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },
    /// Hash and compress the artifacts and write one descriptor per system
    Descriptor {
        /// Target systems (default: every system with a configured JVM)
        #[arg(long = "os")]
        systems: Vec<OperatingSystem>,
        /// Output directory for descriptors and compressed artifacts
        #[arg(short, long, default_value = "dist")]
        out: PathBuf,
        #[command(flatten)]
        key: SigningKeyArgs,
    },
    /// Build launcher executables from the generic stubs
    Executable {
        /// Target systems (default: all)
        #[arg(long = "os")]
        systems: Vec<OperatingSystem>,
        /// Output directory for the launchers
        #[arg(short, long, default_value = "dist")]
        out: PathBuf,
        /// Directory holding `<os>/<signed|unsigned>` stubs
        #[arg(long, env = "NATIVESTART_STUB_DIR")]
        stubs: PathBuf,
        /// Public key file; launchers verify descriptors against it
        #[arg(long)]
        public_key: Option<PathBuf>,
        #[command(flatten)]
        key: SigningKeyArgs,
    },
    /// Generate an Ed25519 key pair for descriptor signing
    Keygen {
        /// Directory to write `<name>.key` and `<name>.pub` to
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
        /// Base name of the key files
        #[arg(long, default_value = "nativestart")]
        name: String,
        /// Overwrite existing key files
        #[arg(long)]
        force: bool,
    },
    /// Print size and checksum of files or directories as descriptors record them
    Hash {
        /// Files or directories to hash
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Checksum algorithm
        #[arg(long, default_value = "sha256")]
        algorithm: HashAlgorithm,
    },
    /// Verify the signature of a descriptor
    Verify {
        /// Descriptor JSON file
        descriptor: PathBuf,
        /// Public key file
        #[arg(long)]
        public_key: PathBuf,
    },
}

/// Where to take the descriptor signing key from.
#[derive(Debug, Clone, Args)]
pub struct SigningKeyArgs {
    /// File holding the base64 encoded Ed25519 secret key
    #[arg(long)]
    pub key_file: Option<PathBuf>,
    /// Base64 encoded Ed25519 secret key
    #[arg(
        long,
        env = "NATIVESTART_SIGNING_KEY",
        hide_env_values = true,
        conflicts_with = "key_file"
    )]
    pub signing_key: Option<String>,
}
