//! Version coercion and selection
//!
//! Release tags are coerced into [`semver::Version`] when the catalog is
//! built; [`select_version`] then picks the highest stable release matching
//! a user supplied [`VersionSpec`].

mod coerce;
mod spec;

pub use coerce::coerce;
pub use spec::VersionSpec;

use anyhow::Result;
use log::{debug, warn};

use crate::catalog::VersionInfo;
use crate::error::SetupError;

/// Pick the highest non-draft, non-prerelease version matching `requested`.
///
/// When two releases share the same version the one listed first wins.
/// A specifier that fails to parse matches nothing.
pub fn select_version<'a>(requested: &str, catalog: &'a [VersionInfo]) -> Result<&'a VersionInfo> {
    let no_match = || SetupError::NoMatchingVersion(requested.to_string());

    let spec: VersionSpec = match requested.parse() {
        Ok(spec) => spec,
        Err(e) => {
            warn!("Cannot parse version specifier '{}': {:#}", requested, e);
            return Err(no_match().into());
        }
    };

    let best = catalog
        .iter()
        .filter(|v| v.is_stable())
        .filter(|v| spec.matches(&v.version))
        .reduce(|best, candidate| {
            if candidate.version > best.version {
                candidate
            } else {
                best
            }
        })
        .ok_or_else(no_match)?;

    debug!("Selected cmake {} for '{}'", best.name(), requested);
    Ok(best)
}
