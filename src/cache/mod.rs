//! Versioned tool cache
//!
//! Layout under the cache root:
//!
//! ```text
//! <root>/cmake/3.19.2/            extracted tree
//! <root>/cmake/3.19.2.complete    marker, written last
//! ```
//!
//! An entry without its marker is a leftover from an interrupted run and is
//! treated as missing.

use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};

const COMPLETE_SUFFIX: &str = "complete";

pub struct ToolCache {
    root: PathBuf,
}

impl ToolCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding `tool` at `version`, whether or not it is cached.
    pub fn tool_dir(&self, tool: &str, version: &str) -> PathBuf {
        self.root.join(tool).join(version)
    }

    fn marker(&self, tool: &str, version: &str) -> PathBuf {
        self.root
            .join(tool)
            .join(format!("{}.{}", version, COMPLETE_SUFFIX))
    }

    /// Cached directory of `tool` at `version`, if a complete entry exists.
    #[tracing::instrument(skip(self, runtime))]
    pub fn find<R: Runtime>(&self, runtime: &R, tool: &str, version: &str) -> Option<PathBuf> {
        let dir = self.tool_dir(tool, version);
        if runtime.exists(&self.marker(tool, version)) && runtime.is_dir(&dir) {
            debug!("Found {} {} in cache at {:?}", tool, version, dir);
            Some(dir)
        } else {
            debug!("{} {} not in cache", tool, version);
            None
        }
    }

    /// Move or copy `source` into the cache and mark the entry complete.
    ///
    /// Any previous entry for the same version is replaced.
    #[tracing::instrument(skip(self, runtime))]
    pub fn store<R: Runtime>(
        &self,
        runtime: &R,
        source: &Path,
        tool: &str,
        version: &str,
    ) -> Result<PathBuf> {
        let dest = self.tool_dir(tool, version);
        let marker = self.marker(tool, version);

        if runtime.exists(&marker) {
            runtime.remove_file(&marker)?;
        }
        if runtime.exists(&dest) {
            debug!("Removing previous cache entry {:?}", dest);
            runtime.remove_dir_all(&dest)?;
        }
        runtime.create_dir_all(&self.root.join(tool))?;

        // Rename fails across file systems; copy instead
        if let Err(e) = runtime.rename(source, &dest) {
            debug!("Cannot move {:?} into cache ({}), copying", source, e);
            copy_dir_all(runtime, source, &dest)
                .with_context(|| format!("Failed to copy {:?} into cache", source))?;
        }

        runtime.write(&marker, b"")?;

        info!("Cached {} {} at {:?}", tool, version, dest);
        Ok(dest)
    }
}

fn copy_dir_all<R: Runtime>(runtime: &R, from: &Path, to: &Path) -> Result<()> {
    runtime.create_dir_all(to)?;
    for item in runtime.read_dir(from)? {
        let Some(name) = item.file_name() else {
            continue;
        };
        let target = to.join(name);
        if runtime.is_dir(&item) {
            copy_dir_all(runtime, &item, &target)?;
        } else {
            runtime.copy(&item, &target)?;
        }
    }
    Ok(())
}
