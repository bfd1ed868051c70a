//! Shared helpers for CLI commands.

use std::path::{Path, PathBuf};

use assetmap::config::Settings;

use crate::error::CliError;

/// Environment variable consulted for the Maximo API key.
pub const API_KEY_ENV: &str = "ASSETMAP_API_KEY";

/// Default config file location relative to the home directory.
const CONFIG_RELATIVE_PATH: &str = ".assetmap/config.ini";

/// Returns the config path: CLI flag, else `~/.assetmap/config.ini`.
pub fn config_path(cli_path: Option<PathBuf>) -> PathBuf {
    cli_path.unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_RELATIVE_PATH)
    })
}

/// Load settings and layer the API key: CLI flag > environment > config file.
pub fn load_settings(path: &Path, cli_api_key: Option<String>) -> Result<Settings, CliError> {
    let mut settings = Settings::load(path)?;

    if let Some(key) = cli_api_key.or_else(|| std::env::var(API_KEY_ENV).ok()) {
        settings = settings.with_api_key(key);
    }

    if settings.gis.services.is_empty() {
        return Err(CliError::Config(format!(
            "no GIS services configured. Add a [gis] services entry to {}",
            path.display()
        )));
    }
    if settings.assets.api_key.is_empty() {
        return Err(CliError::Config(format!(
            "no API key configured. Use --api-key, set {API_KEY_ENV}, \
             or add api_key to the [assets] section of {}",
            path.display()
        )));
    }

    Ok(settings)
}
