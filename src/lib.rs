pub mod archive;
pub mod asset;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod download;
pub mod error;
pub mod http;
pub mod runtime;
pub mod search_path;
pub mod setup;
pub mod version;

pub use config::Config;
pub use error::SetupError;
pub use setup::Installer;
