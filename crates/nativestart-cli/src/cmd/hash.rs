//! `nativestart hash`

use anyhow::{Context, Result};
use nativestart_packer::hashing::hash_path;
use nativestart_packer::schema::HashAlgorithm;
use std::path::PathBuf;

/// Print `<checksum>  <size>  <path>` for every path.
pub fn hash(paths: &[PathBuf], algorithm: HashAlgorithm) -> Result<()> {
    for path in paths {
        let info = hash_path(algorithm, path)
            .with_context(|| format!("Failed to hash {}", path.display()))?;
        println!("{}  {:>10}  {}", info.checksum, info.size, path.display());
    }
    Ok(())
}
