//! Asset classification and selection
//!
//! This module infers the platform, architecture and file kind of release
//! assets from their filenames, and picks the one archive to download for a
//! given platform and ordered list of acceptable architectures.

pub mod infer;
mod picker;
mod platform;

pub use picker::{narrow_ambiguous, select_asset, select_asset_url};
pub use platform::{Arch, FileType, Platform};
