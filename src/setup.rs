//! End-to-end installation: resolve, fetch, cache, expose.

use anyhow::{Context, Result, anyhow};
use log::info;
use std::path::PathBuf;

use crate::archive::{ArchiveExtractor, ArchiveExtractorImpl};
use crate::asset::{Arch, Platform, select_asset_url};
use crate::cache::ToolCache;
use crate::catalog::{CatalogBuilder, GitHubReleases, VersionInfo, releases_url};
use crate::config::{Config, TOOL_NAME};
use crate::download::download_file;
use crate::http::{HttpClient, build_download_client, build_http_client};
use crate::runtime::Runtime;
use crate::search_path::{PathUpdater, bin_dir, path_updater_for};
use crate::version::select_version;

pub struct Installer<R: Runtime> {
    runtime: R,
    extractor: ArchiveExtractorImpl,
}

impl<R: Runtime + 'static> Installer<R> {
    pub fn new(runtime: R) -> Self {
        Self {
            runtime,
            extractor: ArchiveExtractorImpl::new(),
        }
    }

    /// Resolve `config.version_spec`, install it if needed and add its
    /// `bin` directory to the search path. Returns that directory.
    #[tracing::instrument(skip(self, config))]
    pub async fn run(&self, config: &Config) -> Result<PathBuf> {
        let updater = path_updater_for(&self.runtime);
        self.install(config, updater.as_ref()).await
    }

    /// Like [`Installer::run`], with an explicit search path updater.
    pub async fn install(&self, config: &Config, updater: &dyn PathUpdater) -> Result<PathBuf> {
        let api = build_http_client(config.token.as_deref())?;
        let catalog = CatalogBuilder::new(GitHubReleases::new(api), releases_url(&config.api_url))
            .fetch_catalog()
            .await?;

        let version = select_version(&config.version_spec, &catalog)?;
        info!("Resolved '{}' to cmake {}", config.version_spec, version.name());

        let tool_dir = self.ensure_cached(config, version).await?;

        let bin = bin_dir(&self.runtime, &tool_dir);
        updater.add_to_path(&bin)?;
        Ok(bin)
    }

    async fn ensure_cached(&self, config: &Config, version: &VersionInfo) -> Result<PathBuf> {
        let cache = ToolCache::new(&config.cache_root);
        let name = version.name();

        if let Some(dir) = cache.find(&self.runtime, TOOL_NAME, &name) {
            info!("Using cached cmake {} from {:?}", name, dir);
            return Ok(dir);
        }

        let platform = config
            .platform
            .or_else(Platform::current)
            .ok_or_else(|| anyhow!("CMake publishes no binaries for this operating system"))?;
        let url = select_asset_url(version, platform, &Arch::candidates(config.use_32bit))?;
        self.extractor.ensure_supported(&url)?;

        let temp_root = config.temp_dir(&self.runtime);
        self.runtime.create_dir_all(&temp_root)?;
        let work_dir = tempfile::Builder::new()
            .prefix("setup-cmake-")
            .tempdir_in(&temp_root)
            .with_context(|| format!("Failed to create a work directory in {:?}", temp_root))?;

        let http: HttpClient = build_download_client()?;
        let archive = download_file(&self.runtime, &url, work_dir.path(), &http).await?;

        let extracted = work_dir.path().join("extracted");
        self.extractor
            .extract(&self.runtime, &archive, &extracted)
            .with_context(|| format!("Failed to extract {}", url))?;

        cache.store(&self.runtime, &extracted, TOOL_NAME, &name)
    }
}
