//! Making an installed tool visible on the command search path.
//!
//! Inside GitHub Actions the directory is appended to the file named by
//! `GITHUB_PATH`, which the runner prepends to `PATH` for later steps.
//! Elsewhere a shell snippet is printed for the caller to evaluate.

use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};

pub const GITHUB_PATH_VAR: &str = "GITHUB_PATH";

/// Location of the executables inside a macOS application bundle.
const APP_BUNDLE_BIN: &str = "CMake.app/Contents/bin";

pub trait PathUpdater {
    fn add_to_path(&self, dir: &Path) -> Result<()>;
}

/// Appends directories to the runner's `GITHUB_PATH` file.
pub struct GitHubPathFile<'a, R> {
    runtime: &'a R,
    file: PathBuf,
}

impl<'a, R: Runtime> GitHubPathFile<'a, R> {
    pub fn new(runtime: &'a R, file: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            file: file.into(),
        }
    }
}

impl<R: Runtime> PathUpdater for GitHubPathFile<'_, R> {
    #[tracing::instrument(skip(self))]
    fn add_to_path(&self, dir: &Path) -> Result<()> {
        let line = format!("{}\n", dir.display());
        self.runtime
            .append(&self.file, line.as_bytes())
            .with_context(|| format!("Failed to add {:?} to {:?}", dir, self.file))?;
        info!("Added {:?} to {}", dir, GITHUB_PATH_VAR);
        Ok(())
    }
}

/// Prints a command that prepends the directory to `PATH`.
pub struct ShellExport {
    powershell: bool,
}

impl ShellExport {
    pub fn new(powershell: bool) -> Self {
        Self { powershell }
    }

    /// PowerShell on Windows, POSIX shells everywhere else.
    pub fn for_host() -> Self {
        Self::new(cfg!(windows))
    }

    pub fn command(&self, dir: &Path) -> String {
        if self.powershell {
            format!("$env:PATH = \"{};\" + $env:PATH", dir.display())
        } else {
            format!("export PATH=\"{}:$PATH\"", dir.display())
        }
    }
}

impl PathUpdater for ShellExport {
    fn add_to_path(&self, dir: &Path) -> Result<()> {
        println!("{}", self.command(dir));
        Ok(())
    }
}

/// `GitHubPathFile` when `GITHUB_PATH` is set and non-empty, else `ShellExport`.
pub fn path_updater_for<R: Runtime>(runtime: &R) -> Box<dyn PathUpdater + '_> {
    match runtime.env_var(GITHUB_PATH_VAR) {
        Ok(file) if !file.is_empty() => {
            debug!("Using {}={}", GITHUB_PATH_VAR, file);
            Box::new(GitHubPathFile::new(runtime, file))
        }
        _ => {
            debug!("{} not set, printing a shell command", GITHUB_PATH_VAR);
            Box::new(ShellExport::for_host())
        }
    }
}

/// Directory holding the executables of an installed tree.
pub fn bin_dir<R: Runtime>(runtime: &R, tool_dir: &Path) -> PathBuf {
    let bundle = tool_dir.join(APP_BUNDLE_BIN);
    if runtime.is_dir(&bundle) {
        bundle
    } else {
        tool_dir.join("bin")
    }
}
