use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::HashAlgorithm;

/// One downloadable, integrity-checked file or directory bundle.
///
/// `size` and `checksum` always describe the uncompressed content; a
/// launcher verifies them after decompressing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Absolute download URL
    pub url: String,
    /// Uncompressed size in bytes
    pub size: u64,
    /// Transfer size, present only when the artifact is served compressed
    /// and the compressed size differs from `size`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_size: Option<u64>,
    /// Lowercase hex digest of the uncompressed content
    pub checksum: String,
    /// Destination relative to the installation folder
    pub path: String,
}

/// Errors that can occur when validating an [`Artifact`] or verifying a
/// [`Descriptor`].
#[derive(thiserror::Error, Debug)]
pub enum SchemaError {
    /// A required field is empty.
    #[error("Empty field: {0}")]
    EmptyField(&'static str),

    /// The checksum is not lowercase hex of the expected length.
    #[error("Invalid checksum: {0}")]
    InvalidChecksum(String),

    /// The descriptor could not be serialized.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Verification was requested on a descriptor without signature.
    #[error("Descriptor is not signed")]
    Unsigned,

    /// The signature field is not valid hex.
    #[error("Malformed signature: {0}")]
    MalformedSignature(#[from] hex::FromHexError),

    /// The signature does not match the descriptor content.
    #[error("Signature verification failed: {0}")]
    Signature(#[from] ed25519_dalek::SignatureError),
}

impl Artifact {
    /// Validates the fields a launcher relies on.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::EmptyField`] if `path` or `url` is empty and
    /// [`SchemaError::InvalidChecksum`] if the checksum is not a lowercase
    /// hex digest of a supported [`HashAlgorithm`].
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.path.is_empty() {
            return Err(SchemaError::EmptyField("path"));
        }
        if self.url.is_empty() {
            return Err(SchemaError::EmptyField("url"));
        }
        let well_formed = HashAlgorithm::ALL
            .iter()
            .any(|algorithm| algorithm.hex_len() == self.checksum.len())
            && self
                .checksum
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if !well_formed {
            return Err(SchemaError::InvalidChecksum(self.checksum.clone()));
        }
        Ok(())
    }
}

/// How the launcher locates and starts the JVM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct JvmParameters {
    /// Library search path, relative to the installation folder
    pub jvm_path: String,
    /// JVM shared library, relative to `jvm_path` (Windows, macOS) or to the
    /// installation folder (Linux)
    pub jvm_library: String,
    /// Main class in slash form, e.g. `com/example/App`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_class: Option<String>,
    /// JVM command line options, in order
    #[serde(default)]
    pub options: Vec<String>,
}

/// The manifest for one OS-specific build.
///
/// Field order is the wire order; the signature covers the exact pretty
/// printed serialization produced by [`Descriptor::to_json`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Application name
    pub name: String,
    /// Application version
    pub version: String,
    /// Lowercase hex Ed25519 signature, absent when unsigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Splash screen resources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub splash: Option<Artifact>,
    /// JVM launch configuration
    pub jvm_params: JvmParameters,
    /// JVM first, then libraries, then resources
    pub artifacts: Vec<Artifact>,
    /// Folders the installer must never prune, absent when empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unmanaged_paths: Option<Vec<String>>,
}

impl Descriptor {
    /// Pretty printed JSON, exactly as written to disk and as signed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a descriptor from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a descriptor.
    pub fn from_json(s: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(s)?)
    }

    /// The bytes covered by the signature: this descriptor serialized with
    /// `signature` set to the empty string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn signing_payload(&self) -> Result<Vec<u8>, SchemaError> {
        let mut unsigned = self.clone();
        unsigned.signature = Some(String::new());
        Ok(unsigned.to_json()?.into_bytes())
    }

    /// Sign the descriptor in place.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn sign(&mut self, key: &SigningKey) -> Result<(), SchemaError> {
        let payload = self.signing_payload()?;
        let signature = key.sign(&payload);
        self.signature = Some(hex::encode(signature.to_bytes()));
        Ok(())
    }

    /// Verify the signature against `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Unsigned`] if there is no signature, and a
    /// signature error if it is malformed or does not match.
    pub fn verify(&self, key: &VerifyingKey) -> Result<(), SchemaError> {
        let signature = self.signature.as_deref().ok_or(SchemaError::Unsigned)?;
        let bytes = hex::decode(signature)?;
        let signature = Signature::from_slice(&bytes)?;
        key.verify(&self.signing_payload()?, &signature)?;
        Ok(())
    }
}
