//! Descriptor generation.
//!
//! A [`DescriptorBuilder`] accumulates artifacts and JVM settings for one
//! target OS. Hashing happens while accumulating; compression and all file
//! output are deferred to the single terminal [`DescriptorBuilder::generate`]
//! call.
//!
//! ```no_run
//! # fn main() -> nativestart_packer::Result<()> {
//! use std::path::Path;
//! use nativestart_packer::DescriptorBuilder;
//! use nativestart_packer::schema::OperatingSystem;
//!
//! let mut builder = DescriptorBuilder::new("Demo", "1.0.0", OperatingSystem::Linux);
//! builder
//!     .splash(Path::new("splash"), "splash/splash", "splash/")?
//!     .jvm(Path::new("runtime"), "runtime/jdk-linux", "runtime/")?
//!     .library_file(Path::new("demo.jar"))?
//!     .main("com.example.Demo")
//!     .system_property("java.library.path", "runtime/lib");
//!
//! let base = url::Url::parse("https://cdn.example.com/demo/").unwrap();
//! builder.generate(Path::new("dist"), &base, None)?;
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use ed25519_dalek::SigningKey;
use nativestart_schema::{
    Artifact, CompressionAlgorithm, Descriptor, HashAlgorithm, JvmParameters, OperatingSystem,
};
use url::Url;

use crate::archive::{compress, compressed_file_name};
use crate::error::{PackError, Result};
use crate::hashing::hash_path;

/// Which artifact a compression job belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Splash,
    Jvm,
    Library(usize),
    Resource(usize),
}

/// A directory that has to be compressed during `generate`.
#[derive(Debug, Clone)]
struct CompressionJob {
    slot: Slot,
    source: PathBuf,
}

/// An artifact whose URL has not been resolved yet.
#[derive(Debug, Clone)]
struct PendingArtifact {
    download_path: Option<String>,
    path: String,
    size: u64,
    checksum: String,
}

impl PendingArtifact {
    fn resolve(&self, base_url: &Url) -> Artifact {
        let url_or_path = self.download_path.as_deref().unwrap_or(&self.path);
        Artifact {
            url: resolve_url(base_url, url_or_path),
            size: self.size,
            download_size: None,
            checksum: self.checksum.clone(),
            path: self.path.clone(),
        }
    }
}

/// Result of [`DescriptorBuilder::generate`].
#[derive(Debug, Clone)]
pub struct GeneratedDescriptor {
    /// Where the descriptor JSON was written
    pub path: PathBuf,
    /// The descriptor as written
    pub descriptor: Descriptor,
}

/// Builder for the descriptor of one OS-specific build.
///
/// Not meant to be shared: every accumulation method takes `&mut self`.
/// Use one builder per target OS.
#[derive(Debug)]
pub struct DescriptorBuilder {
    name: String,
    version: String,
    os: OperatingSystem,
    hash_algorithm: HashAlgorithm,

    splash: Option<PendingArtifact>,
    jvm: Option<PendingArtifact>,
    jvm_params: JvmParameters,
    libraries: Vec<PendingArtifact>,
    resources: Vec<PendingArtifact>,
    unmanaged_paths: Vec<String>,

    compression: CompressionAlgorithm,
    compression_level: i32,
    jobs: Vec<CompressionJob>,
}

impl DescriptorBuilder {
    /// Create a builder hashing with SHA-256.
    pub fn new(name: impl Into<String>, version: impl Into<String>, os: OperatingSystem) -> Self {
        Self::with_hash(name, version, os, HashAlgorithm::Sha256)
    }

    /// Create a builder using the given checksum algorithm.
    pub fn with_hash(
        name: impl Into<String>,
        version: impl Into<String>,
        os: OperatingSystem,
        hash_algorithm: HashAlgorithm,
    ) -> Self {
        let compression = CompressionAlgorithm::default();
        Self {
            name: name.into(),
            version: version.into(),
            os,
            hash_algorithm,
            splash: None,
            jvm: None,
            jvm_params: JvmParameters::default(),
            libraries: Vec::new(),
            resources: Vec::new(),
            unmanaged_paths: Vec::new(),
            compression,
            compression_level: compression.default_level(),
            jobs: Vec::new(),
        }
    }

    /// Target OS of this builder.
    pub fn os(&self) -> OperatingSystem {
        self.os
    }

    /// Set the splash screen resources.
    ///
    /// `download_path` is relative to the base URL; the compression
    /// extension may be omitted.
    ///
    /// # Errors
    ///
    /// Returns an error if `folder` cannot be hashed.
    pub fn splash(
        &mut self,
        folder: &Path,
        download_path: &str,
        install_path: &str,
    ) -> Result<&mut Self> {
        self.jobs.retain(|job| job.slot != Slot::Splash);
        let artifact =
            self.create_artifact(folder, Some(download_path), install_path, Slot::Splash)?;
        self.splash = Some(artifact);
        Ok(self)
    }

    /// Set the JVM and derive the OS specific JVM locations from
    /// `install_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `folder` cannot be hashed.
    pub fn jvm(
        &mut self,
        folder: &Path,
        download_path: &str,
        install_path: &str,
    ) -> Result<&mut Self> {
        let install_dir = dir(install_path);
        let (jvm_path, jvm_library) = self.os.jvm_layout(&install_dir);
        self.jvm_params.jvm_path = jvm_path;
        self.jvm_params.jvm_library = jvm_library;

        self.jobs.retain(|job| job.slot != Slot::Jvm);
        let artifact = self.create_artifact(folder, Some(download_path), &install_dir, Slot::Jvm)?;
        self.jvm = Some(artifact);
        Ok(self)
    }

    /// Set the main class (fully qualified, dotted form).
    pub fn main(&mut self, main_class: &str) -> &mut Self {
        self.jvm_params.main_class = Some(main_class.replace('.', "/"));
        self
    }

    /// Append a JVM command line option.
    pub fn option(&mut self, option: impl Into<String>) -> &mut Self {
        self.jvm_params.options.push(option.into());
        self
    }

    /// Append `-D<property>=<value>`.
    pub fn system_property(&mut self, property: &str, value: &str) -> &mut Self {
        self.option(format!("-D{property}={value}"))
    }

    /// Add a library. Without `download_path` the URL is derived from the
    /// installation path.
    ///
    /// # Errors
    ///
    /// Returns an error if `file` cannot be hashed.
    pub fn library(
        &mut self,
        file: &Path,
        download_path: Option<&str>,
        install_path: &str,
    ) -> Result<&mut Self> {
        let slot = Slot::Library(self.libraries.len());
        let artifact = self.create_artifact(file, download_path, install_path, slot)?;
        self.libraries.push(artifact);
        Ok(self)
    }

    /// Add a library installed under its own file name.
    ///
    /// # Errors
    ///
    /// Returns an error if `file` cannot be hashed.
    pub fn library_file(&mut self, file: &Path) -> Result<&mut Self> {
        let name = base_name(file)?;
        self.library(file, None, &name)
    }

    /// Add a generic resource. Without `download_path` the URL is derived
    /// from the installation path.
    ///
    /// # Errors
    ///
    /// Returns an error if `file` cannot be hashed.
    pub fn resource(
        &mut self,
        file: &Path,
        download_path: Option<&str>,
        install_path: &str,
    ) -> Result<&mut Self> {
        let slot = Slot::Resource(self.resources.len());
        let artifact = self.create_artifact(file, download_path, install_path, slot)?;
        self.resources.push(artifact);
        Ok(self)
    }

    /// Add a resource installed under its own file name.
    ///
    /// # Errors
    ///
    /// Returns an error if `file` cannot be hashed.
    pub fn resource_file(&mut self, file: &Path) -> Result<&mut Self> {
        let name = base_name(file)?;
        self.resource(file, None, &name)
    }

    /// Mark an installation folder as unmanaged: the launcher never deletes
    /// files from it.
    pub fn unmanaged(&mut self, install_path: impl Into<String>) -> &mut Self {
        self.unmanaged_paths.push(install_path.into());
        self
    }

    /// Compression used for directory artifacts (JVM, splash screen,
    /// resource folders).
    pub fn compression(&mut self, algorithm: CompressionAlgorithm, level: i32) -> &mut Self {
        self.compression = algorithm;
        self.compression_level = level;
        self
    }

    /// Name of the descriptor file, `<name>-<os>.json`.
    pub fn file_name(&self) -> String {
        format!("{}-{}.json", self.name, self.os.as_str())
    }

    /// Compress pending directories into `target_dir`, write the
    /// descriptor, and sign it when a key is given.
    ///
    /// Compressed files that already exist in `target_dir` are reused.
    ///
    /// Without a JVM the descriptor lists libraries and resources only and
    /// leaves `jvmPath` and `jvmLibrary` empty.
    ///
    /// # Errors
    ///
    /// Returns any I/O or serialization error encountered on the way.
    /// Compressed files written before the failure are left in place.
    pub fn generate(
        &self,
        target_dir: &Path,
        base_url: &Url,
        signing_key: Option<&SigningKey>,
    ) -> Result<GeneratedDescriptor> {
        let mut jvm_params = self.jvm_params.clone();
        let classpath = self
            .libraries
            .iter()
            .map(|library| library.path.as_str())
            .collect::<Vec<_>>()
            .join(self.os.path_separator());
        jvm_params.options.push(format!("-Djava.class.path={classpath}"));

        let mut jvm = self.jvm.as_ref().map(|j| j.resolve(base_url));
        let mut splash = self.splash.as_ref().map(|s| s.resolve(base_url));
        let mut libraries: Vec<Artifact> =
            self.libraries.iter().map(|a| a.resolve(base_url)).collect();
        let mut resources: Vec<Artifact> =
            self.resources.iter().map(|a| a.resolve(base_url)).collect();

        fs::create_dir_all(target_dir)?;
        for job in &self.jobs {
            let artifact = match job.slot {
                Slot::Splash => splash.as_mut(),
                Slot::Jvm => jvm.as_mut(),
                Slot::Library(i) => libraries.get_mut(i),
                Slot::Resource(i) => resources.get_mut(i),
            };
            if let Some(artifact) = artifact {
                self.compress_artifact(artifact, &job.source, target_dir)?;
            }
        }

        let mut artifacts = Vec::with_capacity(1 + libraries.len() + resources.len());
        artifacts.extend(jvm);
        artifacts.extend(libraries);
        artifacts.extend(resources);

        let mut descriptor = Descriptor {
            name: self.name.clone(),
            version: self.version.clone(),
            signature: None,
            splash,
            jvm_params,
            artifacts,
            unmanaged_paths: if self.unmanaged_paths.is_empty() {
                None
            } else {
                Some(self.unmanaged_paths.clone())
            },
        };

        if let Some(key) = signing_key {
            descriptor.sign(key)?;
        }

        let path = target_dir.join(self.file_name());
        fs::write(&path, descriptor.to_json()?)?;
        tracing::info!(
            "wrote {} ({} artifacts{})",
            path.display(),
            descriptor.artifacts.len(),
            if descriptor.signature.is_some() { ", signed" } else { "" }
        );

        Ok(GeneratedDescriptor { path, descriptor })
    }

    fn create_artifact(
        &mut self,
        file: &Path,
        download_path: Option<&str>,
        install_path: &str,
        slot: Slot,
    ) -> Result<PendingArtifact> {
        let info = hash_path(self.hash_algorithm, file)?;
        tracing::debug!(
            "hashed {} ({} bytes, {} {})",
            file.display(),
            info.size,
            self.hash_algorithm,
            info.checksum
        );

        if file.is_dir() {
            self.jobs.push(CompressionJob {
                slot,
                source: file.to_path_buf(),
            });
        }

        Ok(PendingArtifact {
            download_path: download_path.map(str::to_string),
            path: install_path.to_string(),
            size: info.size,
            checksum: info.checksum,
        })
    }

    fn compress_artifact(
        &self,
        artifact: &mut Artifact,
        source: &Path,
        target_dir: &Path,
    ) -> Result<()> {
        let extension = self.compression.file_extension();
        let url = artifact.url.trim_end_matches('/').to_string();
        let file_name = url.rsplit('/').next().unwrap_or_default().to_string();
        if !file_name.ends_with(extension) {
            artifact.url = format!("{url}{extension}");
        }

        let compressed = target_dir.join(compressed_file_name(&file_name, self.compression));
        let download_size = if compressed.exists() {
            tracing::debug!("reusing {}", compressed.display());
            fs::metadata(&compressed)?.len()
        } else {
            compress(source, &compressed, self.compression, self.compression_level)?
        };

        if download_size != artifact.size {
            artifact.download_size = Some(download_size);
        }
        Ok(())
    }
}

/// Resolve an artifact location against the base URL. Absolute `http(s)`
/// URLs are kept as they are.
pub fn resolve_url(base_url: &Url, url_or_path: &str) -> String {
    let absolute = Url::parse(url_or_path).is_ok_and(|u| matches!(u.scheme(), "http" | "https"));
    if absolute {
        url_or_path.to_string()
    } else {
        format!("{}{url_or_path}", dir(base_url.as_str()))
    }
}

fn dir(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

fn base_name(file: &Path) -> Result<String> {
    file.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| PackError::Unsupported(file.to_path_buf()))
}
