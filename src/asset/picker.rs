use anyhow::Result;
use log::{debug, warn};

use crate::catalog::{AssetInfo, VersionInfo};
use crate::error::SetupError;

use super::{Arch, FileType, Platform};

/// Marker of a macOS build without a deployment-target qualifier.
const MACOS_UNIVERSAL: &str = "macos-universal";

/// Pick the single archive of `version` for `platform`.
///
/// Architectures are tried in the order given; the first one with any
/// matching archive wins. Remaining ties are narrowed by [`narrow_ambiguous`]
/// and then settled by filename order with a warning.
pub fn select_asset<'a>(
    version: &'a VersionInfo,
    platform: Platform,
    arch_candidates: &[Arch],
) -> Result<&'a AssetInfo> {
    let no_match = || SetupError::NoMatchingAsset {
        platform: platform.to_string(),
        version: version.name(),
    };

    let archives: Vec<&AssetInfo> = version
        .assets
        .iter()
        .filter(|a| a.filetype == Some(FileType::Archive) && a.platform == Some(platform))
        .collect();

    if archives.is_empty() {
        return Err(no_match().into());
    }

    let (arch, mut matching) = arch_candidates
        .iter()
        .map(|arch| {
            let subset = archives
                .iter()
                .copied()
                .filter(|a| a.arch == Some(*arch))
                .collect::<Vec<_>>();
            (*arch, subset)
        })
        .find(|(_, subset)| !subset.is_empty())
        .ok_or_else(no_match)?;

    debug!(
        "Found {} {} assets for {} with version {}",
        matching.len(),
        arch,
        platform,
        version.name()
    );

    if matching.len() > 1 {
        matching = narrow_ambiguous(matching);
    }

    if matching.len() > 1 {
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        warn!(
            "Found {} equally plausible {} assets for cmake {}: {}; using {}",
            matching.len(),
            platform,
            version.name(),
            matching
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            matching[0].name
        );
    }

    let chosen = matching[0];
    debug!("Using asset url {}", chosen.url);
    Ok(chosen)
}

/// Like [`select_asset`], returning only the download URL.
pub fn select_asset_url(
    version: &VersionInfo,
    platform: Platform,
    arch_candidates: &[Arch],
) -> Result<String> {
    select_asset(version, platform, arch_candidates).map(|a| a.url.clone())
}

/// Prefer 64-bit builds and macOS builds without a deployment target.
///
/// Keeps the input unchanged when no asset qualifies.
pub fn narrow_ambiguous(assets: Vec<&AssetInfo>) -> Vec<&AssetInfo> {
    let preferred: Vec<&AssetInfo> = assets
        .iter()
        .copied()
        .filter(|a| {
            a.name.contains("64") || a.url.contains("64") || a.name.contains(MACOS_UNIVERSAL)
        })
        .collect();

    if preferred.is_empty() { assets } else { preferred }
}
