//! CLI command implementations.

pub mod admin;
pub mod serve;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::Context;
use eiei_core::Config;

pub use admin::run_admin;
pub use serve::run_serve;
pub use status::run_status;

/// Load the config file, falling back to defaults when the default file
/// does not exist.
///
/// # Errors
///
/// Returns error if an explicit or existing file cannot be parsed.
pub fn load_config(path: Option<&Path>, data_dir: Option<PathBuf>) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_default().context("Failed to load config")?,
    };

    if let Some(dir) = data_dir {
        config.storage.data_dir = Some(dir);
    }

    Ok(config)
}
