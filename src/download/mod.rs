use crate::http::HttpClient;
use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

/// Fallback file name for URLs without a usable last path segment.
const DEFAULT_FILE_NAME: &str = "download";

/// File name a download URL should be saved under: its last path segment,
/// without query string or fragment.
pub fn file_name_from_url(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let path = &url[..end];
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name,
        _ => DEFAULT_FILE_NAME,
    }
}

/// Downloads `url` into the directory `dest_dir`, returning the file path.
#[tracing::instrument(skip(runtime, dest_dir, http_client))]
pub async fn download_file<R: Runtime>(
    runtime: &R,
    url: &str,
    dest_dir: &Path,
    http_client: &HttpClient,
) -> Result<PathBuf> {
    info!("Downloading {}...", url);

    runtime.create_dir_all(dest_dir)?;
    let dest = dest_dir.join(file_name_from_url(url));

    let bytes = http_client
        .download_file(url, || {
            runtime
                .create_file(&dest)
                .with_context(|| format!("Failed to create file at {:?}", dest))
        })
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    info!("Downloaded {} bytes to {:?}", bytes, dest);
    Ok(dest)
}
