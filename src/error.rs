//! Fatal resolution errors.
//!
//! These travel inside `anyhow::Error` so callers can add context freely and
//! still `downcast_ref::<SetupError>()` to tell the failure kinds apart.

/// Errors that abort the whole resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum SetupError {
    /// A page of the release listing could not be fetched
    Network { url: String },
    /// No stable release satisfies the requested specifier
    NoMatchingVersion(String),
    /// No archive exists for the platform and any candidate architecture
    NoMatchingAsset { platform: String, version: String },
    /// The download URL does not end in a known archive suffix
    UnrecognizedArchiveFormat(String),
}

impl std::fmt::Display for SetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupError::Network { url } => {
                write!(f, "Failed to fetch release listing from {}", url)
            }
            SetupError::NoMatchingVersion(spec) => {
                write!(f, "Unable to find version matching {}", spec)
            }
            SetupError::NoMatchingAsset { platform, version } => {
                write!(
                    f,
                    "Could not find {} asset for cmake version {}",
                    platform, version
                )
            }
            SetupError::UnrecognizedArchiveFormat(url) => {
                write!(f, "Could not determine filetype of {}", url)
            }
        }
    }
}

impl std::error::Error for SetupError {}
