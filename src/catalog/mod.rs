//! Release catalog
//!
//! Fetches the full CMake release listing and normalizes every release into
//! a [`VersionInfo`] with a coerced semantic version and typed assets.

mod github;
mod link;

pub use github::{
    CatalogBuilder, GitHubReleases, MAX_PAGES, Release, ReleaseAsset, ReleasePage, ReleasePages,
    releases_url,
};
pub use link::{next_link, parse_links};

use anyhow::Result;
use log::debug;
use semver::Version;

use crate::asset::infer::{arch_from, filetype_from, platform_from};
use crate::asset::{Arch, FileType, Platform};
use crate::http::build_http_client;
use crate::version::coerce;

/// One downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetInfo {
    pub name: String,
    pub platform: Option<Platform>,
    pub arch: Option<Arch>,
    pub filetype: Option<FileType>,
    pub url: String,
}

impl AssetInfo {
    /// Classify an asset by its filename.
    pub fn from_name(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            platform: platform_from(name),
            arch: arch_from(name),
            filetype: filetype_from(name),
            url: url.to_string(),
        }
    }
}

impl From<ReleaseAsset> for AssetInfo {
    fn from(asset: ReleaseAsset) -> Self {
        Self::from_name(&asset.name, &asset.browser_download_url)
    }
}

/// One release, with its tag coerced into a semantic version.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionInfo {
    pub version: Version,
    pub assets: Vec<AssetInfo>,
    pub url: String,
    pub draft: bool,
    pub prerelease: bool,
}

impl VersionInfo {
    /// Build from a raw release; `None` when the tag holds no version.
    pub fn from_release(release: Release) -> Option<Self> {
        let Some(version) = coerce(&release.tag_name) else {
            debug!("Skipping release '{}': not a version", release.tag_name);
            return None;
        };

        Some(Self {
            version,
            assets: release.assets.into_iter().map(AssetInfo::from).collect(),
            url: release.url,
            draft: release.draft,
            prerelease: release.prerelease,
        })
    }

    /// Canonical version string, e.g. `3.19.2` for tag `v3.19.2`.
    pub fn name(&self) -> String {
        self.version.to_string()
    }

    pub fn is_stable(&self) -> bool {
        !self.draft && !self.prerelease
    }
}

/// All releases, in listing order.
pub type Catalog = Vec<VersionInfo>;

/// Normalize raw releases, dropping those whose tag is not a version.
pub fn normalize(releases: Vec<Release>) -> Catalog {
    releases
        .into_iter()
        .filter_map(VersionInfo::from_release)
        .collect()
}

/// Fetch the catalog from the GitHub API at `api_url`.
#[tracing::instrument(skip(api_token))]
pub async fn fetch_catalog(api_url: &str, api_token: Option<&str>) -> Result<Catalog> {
    let http = build_http_client(api_token)?;
    let builder = CatalogBuilder::new(GitHubReleases::new(http), releases_url(api_url));
    builder.fetch_catalog().await
}
