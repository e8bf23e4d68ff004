//! `nativestart init`

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::config;

/// Write a template configuration to `path`.
pub fn init(path: &Path, name: &str, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("Configuration already exists: {}", path.display());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, config::template(name))?;

    println!("  created {}", path.display());
    println!("  edit it, then run 'nativestart descriptor'");
    Ok(())
}
