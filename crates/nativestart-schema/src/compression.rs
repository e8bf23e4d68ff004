//! Compression algorithms for directory artifacts.

use serde::{Deserialize, Serialize};

/// Compression applied to directory artifacts (JVM, splash screen) before
/// they are served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    /// XZ/LZMA2. Smallest output, but much slower to produce and unpack.
    Xz,
    /// Zstandard (default)
    #[default]
    Zstd,
}

impl CompressionAlgorithm {
    /// Level used when none is configured for this algorithm.
    pub fn default_level(&self) -> i32 {
        match self {
            Self::Xz => 9,
            Self::Zstd => 12,
        }
    }

    /// Extension appended to compressed artifacts, e.g. `.tar.zstd`.
    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Xz => ".tar.xz",
            Self::Zstd => ".tar.zstd",
        }
    }
}

impl std::fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Xz => write!(f, "xz"),
            Self::Zstd => write!(f, "zstd"),
        }
    }
}

impl std::str::FromStr for CompressionAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xz" | "lzma" => Ok(Self::Xz),
            "zstd" | "zst" => Ok(Self::Zstd),
            _ => Err(format!("Unknown compression algorithm: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions() {
        assert_eq!(CompressionAlgorithm::Xz.file_extension(), ".tar.xz");
        assert_eq!(CompressionAlgorithm::Zstd.file_extension(), ".tar.zstd");
        assert_eq!(CompressionAlgorithm::default(), CompressionAlgorithm::Zstd);
        assert_eq!(CompressionAlgorithm::default().default_level(), 12);
    }
}
