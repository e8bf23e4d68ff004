/// Target operating system of a launcher build.
///
/// Every OS-dependent decision in the packer (JVM layout, classpath
/// separator, stub selection, PE resources) matches exhaustively on this
/// enum.
///
/// # Example
///
/// ```
/// use nativestart_schema::OperatingSystem;
///
/// assert_eq!(OperatingSystem::Windows.path_separator(), ";");
/// assert_eq!("linux".parse::<OperatingSystem>(), Ok(OperatingSystem::Linux));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingSystem {
    /// Microsoft Windows (PE executables)
    Windows,
    /// Linux (ELF executables)
    Linux,
    /// macOS (app bundles)
    Mac,
}

impl OperatingSystem {
    /// All supported targets, in a stable order.
    pub const ALL: [Self; 3] = [Self::Windows, Self::Linux, Self::Mac];

    /// Get the operating system this process runs on
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::Mac
        } else {
            Self::Linux
        }
    }

    /// Lowercase name used in descriptor file names and stub directories.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Mac => "mac",
        }
    }

    /// Separator between classpath entries on this OS.
    pub fn path_separator(&self) -> &'static str {
        match self {
            Self::Windows => ";",
            Self::Linux | Self::Mac => ":",
        }
    }

    /// Suffix of the launcher executable (`.exe`, nothing, `.app`).
    pub fn executable_postfix(&self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            Self::Linux => "",
            Self::Mac => ".app",
        }
    }

    /// JVM library search path and shared library for a JVM installed at
    /// `installation` (which must end with `/`).
    ///
    /// Returns `(jvm_path, jvm_library)`.
    pub fn jvm_layout(&self, installation: &str) -> (String, String) {
        match self {
            Self::Windows => (format!("{installation}bin"), "server/jvm.dll".to_string()),
            Self::Linux => (".".to_string(), format!("{installation}lib/server/libjvm.so")),
            // Java 11+ ships jli/libjli.dylib, which the stub does not load yet
            Self::Mac => (format!("{installation}lib"), "libjli.dylib".to_string()),
        }
    }
}

impl std::fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OperatingSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "windows" | "win" | "win64" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            "mac" | "macos" | "darwin" | "osx" => Ok(Self::Mac),
            _ => Err(format!("Unknown operating system: {s}")),
        }
    }
}
