//! Project configuration parsed from `nativestart.toml`.
//!
//! Relative paths in the file are resolved against the directory holding
//! it, so a project can be packaged from any working directory.

use anyhow::{Context, Result};
use nativestart_packer::descriptor::resolve_url;
use nativestart_packer::schema::{CompressionAlgorithm, OperatingSystem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "nativestart.toml";

/// Top-level project configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Application identity and launch settings.
    pub app: AppConfig,
    /// Compression of directory artifacts.
    #[serde(default)]
    pub compression: CompressionConfig,
    /// Splash screen folder.
    pub splash: Option<ArtifactConfig>,
    /// JVM folder per target OS, keyed by OS name.
    #[serde(default)]
    pub jvm: BTreeMap<String, ArtifactConfig>,
    /// Libraries, in classpath order.
    #[serde(default, rename = "library")]
    pub libraries: Vec<ArtifactConfig>,
    /// Additional resources.
    #[serde(default, rename = "resource")]
    pub resources: Vec<ArtifactConfig>,
    /// Windows launcher resources.
    #[serde(default)]
    pub windows: WindowsConfig,

    /// Directory the file was loaded from.
    #[serde(skip)]
    pub root: PathBuf,
}

/// The `[app]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name, also used for descriptor file names.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Fully qualified main class, dotted form.
    pub main_class: Option<String>,
    /// Base URL artifact download paths are resolved against.
    pub base_url: String,
    /// URL the launcher loads its descriptor from. May contain `${OS}` and
    /// `${VERSION}`, which the launcher substitutes.
    pub descriptor_url: Option<String>,
    /// Extra JVM options, in order.
    #[serde(default)]
    pub options: Vec<String>,
    /// Appended as `-D<key>=<value>` after `options`.
    #[serde(default)]
    pub system_properties: BTreeMap<String, String>,
    /// Installation folders the launcher must never prune.
    #[serde(default)]
    pub unmanaged: Vec<String>,
}

/// The `[compression]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// Defaults to zstd.
    #[serde(default)]
    pub algorithm: CompressionAlgorithm,
    /// Defaults to the algorithm's default level.
    pub level: Option<i32>,
}

/// A file or folder shipped with the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Local file or folder, relative to the configuration file.
    #[serde(alias = "file")]
    pub folder: PathBuf,
    /// Download path relative to the base URL, or an absolute URL.
    pub download: Option<String>,
    /// Installation path relative to the application folder.
    pub install: Option<String>,
}

/// The `[windows]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindowsConfig {
    /// `.ico` file for the launcher.
    pub icon: Option<PathBuf>,
    /// Application manifest XML; a default manifest is embedded otherwise.
    pub manifest: Option<PathBuf>,
}

impl ProjectConfig {
    /// Load and parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// its base URL is not a URL.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    /// Parse configuration text. Relative paths stay relative to the
    /// current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration.
    pub fn parse(content: &str) -> Result<Self> {
        let config: ProjectConfig = toml::from_str(content)?;
        config.base_url()?;
        Ok(config)
    }

    /// `path` resolved against the configuration directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    /// The parsed base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if `app.base_url` is not an absolute URL.
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.app.base_url)
            .with_context(|| format!("Invalid base_url: {}", self.app.base_url))
    }

    /// URL embedded into launchers, defaulting to
    /// `<base_url>/<name>-${OS}.json`, next to the artifacts.
    ///
    /// # Errors
    ///
    /// Returns an error if the default is needed and `app.base_url` is
    /// invalid.
    pub fn descriptor_url(&self) -> Result<String> {
        match &self.app.descriptor_url {
            Some(url) => Ok(url.clone()),
            None => Ok(resolve_url(
                &self.base_url()?,
                &format!("{}-${{OS}}.json", self.app.name),
            )),
        }
    }

    /// Compression level to use.
    pub fn compression_level(&self) -> i32 {
        self.compression
            .level
            .unwrap_or_else(|| self.compression.algorithm.default_level())
    }

    /// Target systems with a configured JVM, in [`OperatingSystem::ALL`]
    /// order.
    ///
    /// # Errors
    ///
    /// Returns an error if a `[jvm.<os>]` table names an unknown system.
    pub fn target_systems(&self) -> Result<Vec<OperatingSystem>> {
        let mut systems = Vec::new();
        for key in self.jvm.keys() {
            let os: OperatingSystem = key.parse().map_err(anyhow::Error::msg)?;
            if !systems.contains(&os) {
                systems.push(os);
            }
        }
        systems.sort_by_key(|os| OperatingSystem::ALL.iter().position(|o| o == os));
        Ok(systems)
    }

    /// JVM configured for `os`.
    pub fn jvm_for(&self, os: OperatingSystem) -> Option<&ArtifactConfig> {
        self.jvm
            .iter()
            .find(|(key, _)| key.parse::<OperatingSystem>() == Ok(os))
            .map(|(_, jvm)| jvm)
    }
}

impl ArtifactConfig {
    /// Installation path, defaulting to the local file name.
    pub fn install_path(&self) -> String {
        self.install.clone().unwrap_or_else(|| {
            self.folder
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }

    /// Download path, defaulting to the installation path.
    pub fn download_path(&self) -> String {
        self.download.clone().unwrap_or_else(|| self.install_path())
    }
}

/// Template written by `nativestart init`.
pub fn template(name: &str) -> String {
    format!(
        r#"[app]
name = "{name}"
version = "1.0.0"
main_class = "com.example.Main"
base_url = "https://example.com/{name}/"
# descriptor_url = "https://example.com/{name}/{name}-${{OS}}.json"
options = []
unmanaged = []

[app.system_properties]

[compression]
algorithm = "zstd"
level = 12

# [splash]
# folder = "splash"
# download = "splash/splash"
# install = "splash/"

[jvm.windows]
folder = "jdk/windows"
download = "runtime/jdk-windows"
install = "runtime/"

[jvm.linux]
folder = "jdk/linux"
download = "runtime/jdk-linux"
install = "runtime/"

[jvm.mac]
folder = "jdk/mac"
download = "runtime/jdk-mac"
install = "runtime/"

[[library]]
file = "target/{name}.jar"

[windows]
# icon = "{name}.ico"
# manifest = "{name}.manifest"
"#
    )
}
