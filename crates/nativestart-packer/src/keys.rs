//! Loading Ed25519 keys from raw bytes.

use ed25519_dalek::{PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH, SigningKey, VerifyingKey};

use crate::error::{PackError, Result};

/// Build a signing key from a 32-byte secret or a 64-byte keypair
/// (secret followed by public half).
///
/// # Errors
///
/// Returns [`PackError::InvalidKey`] for any other length and a signature
/// error if the public half of a keypair does not match the secret.
pub fn signing_key(bytes: &[u8]) -> Result<SigningKey> {
    match bytes.len() {
        SECRET_KEY_LENGTH => {
            let mut secret = [0u8; SECRET_KEY_LENGTH];
            secret.copy_from_slice(bytes);
            Ok(SigningKey::from_bytes(&secret))
        }
        64 => {
            let mut keypair = [0u8; 64];
            keypair.copy_from_slice(bytes);
            Ok(SigningKey::from_keypair_bytes(&keypair)?)
        }
        n => Err(PackError::InvalidKey(format!(
            "Ed25519 private key must be 32 or 64 bytes, got {n}"
        ))),
    }
}

/// Build a public key from its 32-byte encoding.
///
/// # Errors
///
/// Returns [`PackError::InvalidKey`] if the input is not 32 bytes or not a
/// valid curve point.
pub fn verifying_key(bytes: &[u8]) -> Result<VerifyingKey> {
    let encoded: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|_| {
        PackError::InvalidKey(format!(
            "Ed25519 public key must be 256 bits, got {} bytes",
            bytes.len()
        ))
    })?;
    VerifyingKey::from_bytes(&encoded)
        .map_err(|e| PackError::InvalidKey(format!("not an Ed25519 public key: {e}")))
}
