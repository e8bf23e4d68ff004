//! Locating the precompiled launcher stubs.
//!
//! Stubs are produced by a separate native toolchain. Four variants per
//! OS are expected, laid out as `<os>/<signed|unsigned><postfix>`, e.g.
//! `windows/signed.exe` or `linux/unsigned`.

use std::fs;
use std::path::{Path, PathBuf};

use nativestart_schema::OperatingSystem;

use crate::error::Result;

/// Environment variable pointing at the stub directory.
pub const STUB_DIR_ENV: &str = "NATIVESTART_STUB_DIR";

/// Source of generic stub binaries.
pub trait StubSource {
    /// Load the stub for `os`; `signed` selects the variant that verifies
    /// descriptor signatures (and carries the public key placeholder).
    ///
    /// # Errors
    ///
    /// Returns an error if the stub cannot be read.
    fn load(&self, os: OperatingSystem, signed: bool) -> Result<Vec<u8>>;
}

/// Relative path of a stub variant, e.g. `mac/unsigned.app`.
pub fn stub_path(os: OperatingSystem, signed: bool) -> PathBuf {
    let variant = if signed { "signed" } else { "unsigned" };
    Path::new(os.as_str()).join(format!("{variant}{}", os.executable_postfix()))
}

/// Stubs stored in a directory on disk.
#[derive(Debug, Clone)]
pub struct StubDirectory {
    root: PathBuf,
}

impl StubDirectory {
    /// Use stubs below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Use the directory named by `NATIVESTART_STUB_DIR`, if set.
    pub fn from_env() -> Option<Self> {
        std::env::var_os(STUB_DIR_ENV).map(Self::new)
    }

    /// Root directory of the stubs.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl StubSource for StubDirectory {
    fn load(&self, os: OperatingSystem, signed: bool) -> Result<Vec<u8>> {
        let path = self.root.join(stub_path(os, signed));
        tracing::debug!("loading stub {}", path.display());
        Ok(fs::read(path)?)
    }
}
