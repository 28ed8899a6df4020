use anyhow::bail;
use std::fmt;
use std::str::FromStr;

/// Operating system a release asset is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    Darwin,
    Win32,
}

impl Platform {
    /// The platform of the running host, or `None` if CMake publishes no
    /// binaries for it.
    pub fn current() -> Option<Self> {
        #[cfg(target_os = "macos")]
        {
            Some(Platform::Darwin)
        }
        #[cfg(target_os = "linux")]
        {
            Some(Platform::Linux)
        }
        #[cfg(target_os = "windows")]
        {
            Some(Platform::Win32)
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Darwin => "darwin",
            Platform::Win32 => "win32",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linux" => Ok(Platform::Linux),
            "darwin" | "macos" => Ok(Platform::Darwin),
            "win32" | "windows" => Ok(Platform::Win32),
            _ => bail!(
                "Unknown platform: {}. Expected linux, darwin, or win32.",
                s
            ),
        }
    }
}

/// CPU architecture a release asset is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86_64,
    X86,
}

impl Arch {
    /// Architectures to try, in priority order.
    ///
    /// 64-bit first with a 32-bit fallback, or 32-bit only when requested.
    pub fn candidates(use_32bit: bool) -> Vec<Arch> {
        if use_32bit {
            vec![Arch::X86]
        } else {
            vec![Arch::X86_64, Arch::X86]
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::X86 => "x86",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of file, judged from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Archive,
    Package,
    Script,
    Text,
}
