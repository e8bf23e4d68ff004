//! `nativestart descriptor`

use anyhow::{Context, Result};
use ed25519_dalek::SigningKey;
use nativestart_packer::DescriptorBuilder;
use nativestart_packer::schema::OperatingSystem;
use std::path::{Path, PathBuf};

use crate::config::ProjectConfig;

/// Generate the descriptor of every system in `systems` (or every system
/// with a configured JVM) into `out`. Returns the descriptor paths.
pub fn descriptor(
    config: &ProjectConfig,
    systems: &[OperatingSystem],
    out: &Path,
    key: Option<&SigningKey>,
) -> Result<Vec<PathBuf>> {
    let base_url = config.base_url()?;
    let systems = if systems.is_empty() {
        config.target_systems()?
    } else {
        systems.to_vec()
    };
    if systems.is_empty() {
        anyhow::bail!("No [jvm.<os>] table configured");
    }

    let mut written = Vec::with_capacity(systems.len());
    for os in systems {
        let builder = builder_for(config, os)?;
        let generated = builder
            .generate(out, &base_url, key)
            .with_context(|| format!("Failed to generate the {os} descriptor"))?;
        println!(
            "  wrote {} ({} artifacts{})",
            generated.path.display(),
            generated.descriptor.artifacts.len(),
            if key.is_some() { ", signed" } else { "" }
        );
        written.push(generated.path);
    }
    Ok(written)
}

/// A descriptor builder loaded with everything `config` declares for `os`.
pub fn builder_for(config: &ProjectConfig, os: OperatingSystem) -> Result<DescriptorBuilder> {
    let jvm = config
        .jvm_for(os)
        .with_context(|| format!("No [jvm.{os}] table configured"))?;

    let mut builder = DescriptorBuilder::new(&config.app.name, &config.app.version, os);
    builder.compression(config.compression.algorithm, config.compression_level());

    if let Some(splash) = &config.splash {
        let folder = config.resolve(&splash.folder);
        builder
            .splash(&folder, &splash.download_path(), &splash.install_path())
            .with_context(|| format!("Failed to add splash screen {}", folder.display()))?;
    }

    let folder = config.resolve(&jvm.folder);
    builder
        .jvm(&folder, &jvm.download_path(), &jvm.install_path())
        .with_context(|| format!("Failed to add JVM {}", folder.display()))?;

    for library in &config.libraries {
        let file = config.resolve(&library.folder);
        builder
            .library(&file, library.download.as_deref(), &library.install_path())
            .with_context(|| format!("Failed to add library {}", file.display()))?;
    }
    for resource in &config.resources {
        let file = config.resolve(&resource.folder);
        builder
            .resource(&file, resource.download.as_deref(), &resource.install_path())
            .with_context(|| format!("Failed to add resource {}", file.display()))?;
    }

    if let Some(main_class) = &config.app.main_class {
        builder.main(main_class);
    }
    for option in &config.app.options {
        builder.option(option.clone());
    }
    for (property, value) in &config.app.system_properties {
        builder.system_property(property, value);
    }
    for path in &config.app.unmanaged {
        builder.unmanaged(path.clone());
    }

    Ok(builder)
}
