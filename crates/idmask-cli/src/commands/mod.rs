//! Subcommand implementations.

pub mod config;
pub mod convert;
pub mod locate;

use std::path::PathBuf;

use idmask_core::models::config::IdmaskConfig;

/// Config file used when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("idmask")
        .join("config.json")
}

/// Config file selected by `--config`, else the default location.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the effective configuration.
///
/// An explicit `--config` file must exist; the default file is optional.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<IdmaskConfig> {
    let path = config_file(config_path);
    if config_path.is_some() || path.exists() {
        IdmaskConfig::from_file(&path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path.display(), e))
    } else {
        Ok(IdmaskConfig::default())
    }
}
