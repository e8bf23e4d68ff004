//! Base64 key files as written by `nativestart keygen`.

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::{SigningKey, VerifyingKey};
use nativestart_packer::keys;
use std::fs;
use std::path::Path;

use crate::SigningKeyArgs;

/// Decode a base64 secret key (32-byte secret or 64-byte keypair).
pub fn decode_signing_key(text: &str) -> Result<SigningKey> {
    let bytes = STANDARD.decode(text.trim()).context("Invalid Base64 signing key")?;
    Ok(keys::signing_key(&bytes)?)
}

/// Decode a base64 public key.
pub fn decode_public_key(text: &str) -> Result<VerifyingKey> {
    let bytes = STANDARD.decode(text.trim()).context("Invalid Base64 public key")?;
    Ok(keys::verifying_key(&bytes)?)
}

/// Read a secret key file.
pub fn read_signing_key(path: &Path) -> Result<SigningKey> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read key file {}", path.display()))?;
    decode_signing_key(&text).with_context(|| format!("Bad key file {}", path.display()))
}

/// Read a public key file.
pub fn read_public_key(path: &Path) -> Result<VerifyingKey> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read key file {}", path.display()))?;
    decode_public_key(&text).with_context(|| format!("Bad key file {}", path.display()))
}

/// Encode a key for a key file.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

impl SigningKeyArgs {
    /// The configured signing key, if any.
    pub fn load(&self) -> Result<Option<SigningKey>> {
        if let Some(path) = &self.key_file {
            return read_signing_key(path).map(Some);
        }
        self.signing_key
            .as_deref()
            .map(|text| {
                decode_signing_key(text).context("NATIVESTART_SIGNING_KEY is not a valid key")
            })
            .transpose()
    }
}
