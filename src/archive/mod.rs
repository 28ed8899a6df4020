mod tar_gz;
mod zip;

use crate::error::SetupError;
use crate::runtime::Runtime;
use anyhow::{Context, Result, anyhow};
use log::debug;
use std::path::{Component, Path, PathBuf};

pub use tar_gz::TarGzExtractor;
pub use zip::ZipExtractor;

/// Trait for format-specific archive extractors
pub trait ArchiveExtractor: Send + Sync {
    /// Check if this extractor can handle the given archive name or URL
    fn can_handle(&self, archive: &str) -> bool;

    /// Extract the archive into `extract_to`, dropping a single top-level
    /// directory if the archive has one.
    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()>;
}

/// Dispatcher that selects the appropriate extractor by file suffix.
pub struct ArchiveExtractorImpl {
    tar_gz: TarGzExtractor,
    zip: ZipExtractor,
}

impl Default for ArchiveExtractorImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveExtractorImpl {
    pub fn new() -> Self {
        Self {
            tar_gz: TarGzExtractor,
            zip: ZipExtractor,
        }
    }

    /// Fail early with [`SetupError::UnrecognizedArchiveFormat`] for a
    /// download URL no extractor understands.
    pub fn ensure_supported(&self, url: &str) -> Result<()> {
        if self.can_handle(url) {
            Ok(())
        } else {
            Err(SetupError::UnrecognizedArchiveFormat(url.to_string()).into())
        }
    }
}

impl ArchiveExtractor for ArchiveExtractorImpl {
    fn can_handle(&self, archive: &str) -> bool {
        self.tar_gz.can_handle(archive) || self.zip.can_handle(archive)
    }

    #[tracing::instrument(skip(self, runtime, archive_path, extract_to))]
    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()> {
        let name = archive_path.to_string_lossy();
        if self.tar_gz.can_handle(&name) {
            return self.tar_gz.extract(runtime, archive_path, extract_to);
        }
        if self.zip.can_handle(&name) {
            return self.zip.extract(runtime, archive_path, extract_to);
        }
        Err(SetupError::UnrecognizedArchiveFormat(name.into_owned()).into())
    }
}

/// Lower-cased archive name with any URL query or fragment removed.
fn suffix_source(archive: &str) -> String {
    let end = archive.find(['?', '#']).unwrap_or(archive.len());
    archive[..end].to_lowercase()
}

/// Relative path of an archive entry, or `None` if it would escape the
/// extraction directory.
fn sanitize_entry_path(path: &Path) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!clean.as_os_str().is_empty()).then_some(clean)
}

/// Whether `target`, read relative to the directory holding `entry_path`,
/// stays inside the extraction root.
///
/// Only `../` steps followed by plain names are accepted, so a target can
/// never climb back out through another link.
fn link_target_within(entry_path: &Path, target: &Path) -> bool {
    let mut depth = entry_path.components().count().saturating_sub(1);
    let mut descending = false;
    for component in target.components() {
        match component {
            Component::Normal(_) => {
                descending = true;
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir if !descending && depth > 0 => depth -= 1,
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

/// Whether `entry_path` under `root`, or any directory leading to it, is a
/// symlink created by an earlier entry.
fn passes_through_symlink<R: Runtime>(runtime: &R, root: &Path, entry_path: &Path) -> bool {
    let mut current = root.to_path_buf();
    entry_path.components().any(|component| {
        current.push(component);
        runtime.is_symlink(&current)
    })
}

/// Scratch directory next to `extract_to`, emptied before use.
fn prepare_staging_dir<R: Runtime>(runtime: &R, extract_to: &Path) -> Result<PathBuf> {
    let file_name = extract_to
        .file_name()
        .ok_or_else(|| anyhow!("Invalid extraction directory {:?}", extract_to))?;
    let staging = extract_to.with_file_name(format!("{}_temp_extract", file_name.to_string_lossy()));

    if runtime.exists(&staging) {
        runtime.remove_dir_all(&staging)?;
    }
    runtime.create_dir_all(&staging)?;

    debug!("Unpacking to temp dir: {:?}", staging);
    Ok(staging)
}

/// Move the unpacked tree from `staging` into `extract_to`.
///
/// A lone top-level directory (`cmake-3.19.2-Linux-x86_64/`) is stripped.
fn promote_staging_dir<R: Runtime>(runtime: &R, staging: &Path, extract_to: &Path) -> Result<()> {
    let entries = runtime
        .read_dir(staging)
        .context("Failed to read temp extraction directory")?;

    let source_dir = match entries.as_slice() {
        [] => return Err(anyhow!("Archive appears to be empty.")),
        [single] if runtime.is_dir(single) => single.clone(),
        _ => staging.to_path_buf(),
    };

    runtime.create_dir_all(extract_to)?;

    debug!("Moving contents from {:?} to {:?}", source_dir, extract_to);
    for item in runtime.read_dir(&source_dir)? {
        let Some(name) = item.file_name() else {
            continue;
        };
        runtime.rename(&item, &extract_to.join(name))?;
    }

    runtime.remove_dir_all(staging)?;
    Ok(())
}
