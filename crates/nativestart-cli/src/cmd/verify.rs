//! `nativestart verify`

use anyhow::{Context, Result};
use nativestart_packer::schema::Descriptor;
use std::fs;
use std::path::Path;

use crate::keyfile;

/// Check the signature of a descriptor file against a public key file.
pub fn verify(descriptor: &Path, public_key: &Path) -> Result<()> {
    let key = keyfile::read_public_key(public_key)?;
    let json = fs::read_to_string(descriptor)
        .with_context(|| format!("Failed to read {}", descriptor.display()))?;
    let descriptor_data = Descriptor::from_json(&json)
        .with_context(|| format!("Failed to parse {}", descriptor.display()))?;

    for artifact in &descriptor_data.artifacts {
        artifact
            .validate()
            .with_context(|| format!("Invalid artifact {}", artifact.path))?;
    }
    descriptor_data
        .verify(&key)
        .with_context(|| format!("Signature check failed for {}", descriptor.display()))?;

    println!(
        "  {} {} ({}): signature ok",
        descriptor_data.name,
        descriptor_data.version,
        descriptor.display()
    );
    Ok(())
}
