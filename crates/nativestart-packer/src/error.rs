//! Error type shared by both packaging pipelines.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the packer.
pub type Result<T, E = PackError> = std::result::Result<T, E>;

/// Errors that stop a descriptor or executable build.
///
/// Nothing in the packer recovers from these; the first one aborts the
/// build and is handed to the caller.
#[derive(Error, Debug)]
pub enum PackError {
    /// Reading or writing a file, directory or stream failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The input is neither a regular file nor a directory.
    #[error("Unsupported input: {} is neither a file nor a directory", .0.display())]
    Unsupported(PathBuf),

    /// An icon, manifest or PE image could not be parsed or rebuilt.
    #[error("Malformed input: {0}")]
    Malformed(String),

    /// The stub does not contain the expected placeholder (stub and packer
    /// versions do not match).
    #[error("Placeholder {0} not found in stub")]
    PlaceholderNotFound(&'static str),

    /// A public or private key has the wrong type or length.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The Ed25519 library rejected a key or signature.
    #[error("Signature error: {0}")]
    Signature(#[from] ed25519_dalek::SignatureError),

    /// The descriptor could not be serialized.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<walkdir::Error> for PackError {
    fn from(e: walkdir::Error) -> Self {
        Self::Io(e.into())
    }
}

impl From<goblin::error::Error> for PackError {
    fn from(e: goblin::error::Error) -> Self {
        Self::Malformed(format!("PE image: {e}"))
    }
}

impl From<nativestart_schema::SchemaError> for PackError {
    fn from(e: nativestart_schema::SchemaError) -> Self {
        match e {
            nativestart_schema::SchemaError::Json(e) => Self::Json(e),
            nativestart_schema::SchemaError::Signature(e) => Self::Signature(e),
            other => Self::Malformed(other.to_string()),
        }
    }
}
