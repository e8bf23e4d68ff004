//! `nativestart executable`

use anyhow::{Context, Result};
use ed25519_dalek::VerifyingKey;
use nativestart_packer::schema::OperatingSystem;
use nativestart_packer::{ExecutableBuilder, StubSource};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::config::ProjectConfig;

/// File name of the launcher for `os`, e.g. `Demo-windows.exe`.
pub fn launcher_name(name: &str, os: OperatingSystem) -> String {
    format!("{name}-{os}{}", os.executable_postfix())
}

/// Build the launcher of every system in `systems` (all when empty) into
/// `out`. With a key the signed stubs are used. Returns the launcher paths.
pub fn executable(
    config: &ProjectConfig,
    systems: &[OperatingSystem],
    out: &Path,
    stubs: &dyn StubSource,
    key: Option<VerifyingKey>,
) -> Result<Vec<PathBuf>> {
    let systems = if systems.is_empty() {
        OperatingSystem::ALL.to_vec()
    } else {
        systems.to_vec()
    };

    let mut builder = ExecutableBuilder::new(&config.app.name, config.descriptor_url()?);
    if let Some(key) = key {
        builder.key(key);
    }
    if let Some(icon) = &config.windows.icon {
        let path = config.resolve(icon);
        let file = File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
        builder.windows_icon(file)?;
    }
    if let Some(manifest) = &config.windows.manifest {
        let path = config.resolve(manifest);
        let file = File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
        builder.windows_manifest(file)?;
    }

    fs::create_dir_all(out)?;
    let mut written = Vec::with_capacity(systems.len());
    for os in systems {
        let bytes = builder
            .build_bytes(os, stubs)
            .with_context(|| format!("Failed to build the {os} launcher"))?;
        let path = out.join(launcher_name(&config.app.name, os));
        fs::write(&path, &bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        }

        println!(
            "  wrote {} ({} bytes{})",
            path.display(),
            bytes.len(),
            if builder.is_signed() { ", signed" } else { "" }
        );
        written.push(path);
    }
    Ok(written)
}
