use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::SetupError;
use crate::http::{HttpClient, JsonPage};

use super::link::next_link;
use super::{Catalog, normalize};

/// Upper bound on the number of release pages requested, first page included.
pub const MAX_PAGES: u32 = 20;

const REPO: &str = "Kitware/CMake";

/// Release listing endpoint under an API base URL.
pub fn releases_url(api_url: &str) -> String {
    format!("{}/repos/{}/releases", api_url.trim_end_matches('/'), REPO)
}

/// Represents a GitHub release asset
#[derive(Deserialize, Serialize, Debug, PartialEq, Clone)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// Represents a GitHub release
#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, Default)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// One page of the release listing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReleasePage {
    pub releases: Vec<Release>,
    pub link: Option<String>,
}

impl From<JsonPage<Vec<Release>>> for ReleasePage {
    fn from(page: JsonPage<Vec<Release>>) -> Self {
        Self {
            releases: page.body,
            link: page.link,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleasePages: Send + Sync {
    /// Fetch `url`, adding `?page=<n>` when `page` is given.
    async fn fetch(&self, url: &str, page: Option<u32>) -> Result<ReleasePage>;
}

/// [`ReleasePages`] backed by the GitHub REST API.
pub struct GitHubReleases {
    http: HttpClient,
}

impl GitHubReleases {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ReleasePages for GitHubReleases {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, url: &str, page: Option<u32>) -> Result<ReleasePage> {
        let query: Vec<(&str, String)> = page
            .map(|p| vec![("page", p.to_string())])
            .unwrap_or_default();

        let page: JsonPage<Vec<Release>> = self.http.get_page(url, &query).await?;
        Ok(page.into())
    }
}

/// Collects every page of the release listing into a [`Catalog`].
///
/// If the first response carries a `Link` header, `rel="next"` URLs are
/// followed until one is missing or repeats. Otherwise pages 2, 3, ... are
/// requested until an empty page. Both modes stop after [`MAX_PAGES`].
/// Any failing page aborts the fetch.
pub struct CatalogBuilder<P> {
    pages: P,
    releases_url: String,
}

impl<P: ReleasePages> CatalogBuilder<P> {
    pub fn new(pages: P, releases_url: impl Into<String>) -> Self {
        Self {
            pages,
            releases_url: releases_url.into(),
        }
    }

    /// Fetch all releases and normalize them.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_catalog(&self) -> Result<Catalog> {
        let releases = self.fetch_releases().await?;
        Ok(normalize(releases))
    }

    /// Fetch the raw releases of every page, in request order.
    pub async fn fetch_releases(&self) -> Result<Vec<Release>> {
        debug!("Fetching releases from {}...", self.releases_url);

        let first = self.fetch_page(&self.releases_url, None).await?;
        let mut releases = first.releases;

        match first.link {
            Some(link) => self.follow_links(&link, &mut releases).await?,
            None => self.follow_page_numbers(&mut releases).await?,
        }

        debug!("Fetched {} releases", releases.len());
        Ok(releases)
    }

    async fn follow_links(&self, first_link: &str, releases: &mut Vec<Release>) -> Result<()> {
        let mut visited = HashSet::from([self.releases_url.clone()]);
        let mut next = next_link(first_link);
        let mut fetched = 1;

        while let Some(url) = next {
            if fetched >= MAX_PAGES {
                warn!("Stopping at {} release pages, more are linked from {}", MAX_PAGES, url);
                break;
            }
            if !visited.insert(url.clone()) {
                warn!("Link header points back to {}, stopping pagination", url);
                break;
            }

            let page = self.fetch_page(&url, None).await?;
            fetched += 1;
            releases.extend(page.releases);
            next = page.link.as_deref().and_then(next_link);
        }

        Ok(())
    }

    async fn follow_page_numbers(&self, releases: &mut Vec<Release>) -> Result<()> {
        for page_number in 2..=MAX_PAGES {
            let page = self.fetch_page(&self.releases_url, Some(page_number)).await?;
            if page.releases.is_empty() {
                break;
            }
            releases.extend(page.releases);
        }

        Ok(())
    }

    async fn fetch_page(&self, url: &str, page: Option<u32>) -> Result<ReleasePage> {
        debug!("Fetching release page {} (page={:?})", url, page);

        let display_url = match page {
            Some(p) => format!("{}?page={}", url, p),
            None => url.to_string(),
        };

        self.pages
            .fetch(url, page)
            .await
            .context(SetupError::Network { url: display_url })
    }
}
