//! Placeholder substitution in stub binaries.
//!
//! Every stub carries fixed-size, space padded ASCII placeholders that are
//! overwritten in place. The search is a Knuth-Morris-Pratt scan so stubs
//! of any size are handled in linear time.

use ed25519_dalek::{PUBLIC_KEY_LENGTH, VerifyingKey};

use crate::error::{PackError, Result};

/// Size of the application name slot.
pub const NAME_SLOT: usize = 64;
/// Size of the descriptor URL slot.
pub const URL_SLOT: usize = 256;

pub(crate) const NAME_PLACEHOLDER: &str = "APPLICATION_NAME";
pub(crate) const URL_PLACEHOLDER: &str = "APPLICATION_DESCRIPTOR_URL";
pub(crate) const KEY_PLACEHOLDER: &[u8; PUBLIC_KEY_LENGTH] = b"$REPLACE_APPLICATION_PUBLIC_KEY$";

/// Right-pad `value` with spaces to exactly `len` bytes.
///
/// # Errors
///
/// Returns [`PackError::Malformed`] if `value` does not fit.
pub fn pad_right(value: &str, len: usize) -> Result<Vec<u8>> {
    let mut bytes = value.as_bytes().to_vec();
    if bytes.len() > len {
        return Err(PackError::Malformed(format!(
            "'{value}' is {} bytes, the stub only has room for {len}",
            bytes.len()
        )));
    }
    bytes.resize(len, b' ');
    Ok(bytes)
}

/// Values substituted into one stub.
#[derive(Debug, Clone)]
pub struct Placeholders {
    name: Vec<u8>,
    url: Vec<u8>,
    key: Option<[u8; PUBLIC_KEY_LENGTH]>,
}

impl Placeholders {
    /// Prepare the substitution values.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Malformed`] if the name or URL exceed their slot.
    pub fn new(name: &str, url: &str, key: Option<&VerifyingKey>) -> Result<Self> {
        Ok(Self {
            name: pad_right(name, NAME_SLOT)?,
            url: pad_right(url, URL_SLOT)?,
            key: key.map(VerifyingKey::to_bytes),
        })
    }

    /// Patch every placeholder in `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::PlaceholderNotFound`] if the stub lacks one of
    /// the placeholders.
    pub fn apply(&self, bytes: &mut [u8]) -> Result<()> {
        let name_generic = pad_right(NAME_PLACEHOLDER, NAME_SLOT)?;
        let url_generic = pad_right(URL_PLACEHOLDER, URL_SLOT)?;

        replace(bytes, &name_generic, &self.name, NAME_PLACEHOLDER)?;
        replace(bytes, &url_generic, &self.url, URL_PLACEHOLDER)?;
        if let Some(key) = &self.key {
            replace(bytes, KEY_PLACEHOLDER, key, "APPLICATION_PUBLIC_KEY")?;
        }
        Ok(())
    }
}

/// Overwrite the first occurrence of `search` with `replacement` (which
/// must have the same length). Returns the patched offset.
fn replace(
    data: &mut [u8],
    search: &[u8],
    replacement: &[u8],
    label: &'static str,
) -> Result<usize> {
    debug_assert_eq!(search.len(), replacement.len());
    let pos = index_of(data, search).ok_or(PackError::PlaceholderNotFound(label))?;
    data[pos..pos + replacement.len()].copy_from_slice(replacement);
    tracing::debug!("patched {label} at offset {pos:#x}");
    Ok(pos)
}

/// Position of the first occurrence of `pattern` in `data`.
pub fn index_of(data: &[u8], pattern: &[u8]) -> Option<usize> {
    if pattern.is_empty() {
        return Some(0);
    }
    let failure = compute_failure(pattern);

    let mut j = 0;
    for (i, &byte) in data.iter().enumerate() {
        while j > 0 && pattern[j] != byte {
            j = failure[j - 1];
        }
        if pattern[j] == byte {
            j += 1;
        }
        if j == pattern.len() {
            return Some(i + 1 - pattern.len());
        }
    }
    None
}

/// KMP failure function: for every prefix, the length of its longest
/// proper prefix that is also a suffix.
fn compute_failure(pattern: &[u8]) -> Vec<usize> {
    let mut failure = vec![0; pattern.len()];

    let mut j = 0;
    for i in 1..pattern.len() {
        while j > 0 && pattern[j] != pattern[i] {
            j = failure[j - 1];
        }
        if pattern[j] == pattern[i] {
            j += 1;
        }
        failure[i] = j;
    }
    failure
}
