use crate::runtime::Runtime;
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use log::{debug, info, warn};
use std::path::Path;
use tar::{Archive, EntryType};

use super::{
    ArchiveExtractor, link_target_within, passes_through_symlink, prepare_staging_dir,
    promote_staging_dir, sanitize_entry_path, suffix_source,
};

/// Extractor for .tar.gz / .tgz archives
pub struct TarGzExtractor;

impl ArchiveExtractor for TarGzExtractor {
    fn can_handle(&self, archive: &str) -> bool {
        let name = suffix_source(archive);
        name.ends_with(".tar.gz") || name.ends_with(".tgz")
    }

    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()> {
        debug!("Extracting tar.gz archive to {:?}...", extract_to);
        let file = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;

        let mut archive = Archive::new(GzDecoder::new(file));
        let staging = prepare_staging_dir(runtime, extract_to)?;

        let entries = archive
            .entries()
            .with_context(|| format!("Failed to read tar archive {:?}", archive_path))?;

        for entry in entries {
            let mut entry = entry.context("Failed to read tar entry")?;

            let raw_path = entry.path().context("Invalid tar entry path")?.into_owned();
            let Some(entry_path) = sanitize_entry_path(&raw_path) else {
                debug!("Skipping entry with unsafe path {:?}", raw_path);
                continue;
            };
            let full_path = staging.join(&entry_path);
            if passes_through_symlink(runtime, &staging, &entry_path) {
                warn!("Skipping entry {:?} that would be written through a link", entry_path);
                continue;
            }

            match entry.header().entry_type() {
                EntryType::Directory => runtime.create_dir_all(&full_path)?,
                EntryType::Regular | EntryType::Continuous => {
                    if let Some(parent) = full_path.parent() {
                        runtime.create_dir_all(parent)?;
                    }
                    let mut dest_file = runtime.create_file(&full_path)?;
                    std::io::copy(&mut entry, &mut dest_file)
                        .with_context(|| format!("Failed to extract file {:?}", full_path))?;
                    drop(dest_file);

                    if let Ok(mode) = entry.header().mode()
                        && let Err(e) = runtime.set_permissions(&full_path, mode)
                    {
                        debug!("Failed to set permissions on {:?}: {}", full_path, e);
                    }
                }
                EntryType::Symlink => {
                    // Bundles on macOS link frameworks
                    let target = entry
                        .link_name()
                        .context("Invalid tar link target")?
                        .map(|t| t.into_owned());
                    let Some(target) = target.filter(|t| link_target_within(&entry_path, t)) else {
                        warn!("Skipping link {:?} pointing outside the archive", entry_path);
                        continue;
                    };
                    if runtime.exists(&full_path) {
                        debug!("Skipping link {:?} over an existing entry", entry_path);
                        continue;
                    }
                    debug!("Linking {:?} -> {:?}", entry_path, target);
                    if let Some(parent) = full_path.parent() {
                        runtime.create_dir_all(parent)?;
                    }
                    entry
                        .unpack(&full_path)
                        .with_context(|| format!("Failed to create link {:?}", full_path))?;
                }
                other => debug!("Skipping {:?} entry {:?}", other, entry_path),
            }
        }

        promote_staging_dir(runtime, &staging, extract_to)?;

        info!("Extraction complete.");
        Ok(())
    }
}
