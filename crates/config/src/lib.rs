pub mod schema;
pub mod watcher;

pub use schema::{FeedConfig, PredictorConfig, WattcastConfig};
pub use watcher::ConfigWatcher;

use std::path::{Path, PathBuf};
use wattcast_core::{ForecastError, Result};

/// Load configuration from a TOML file.  Returns `WattcastConfig::default()`
/// if the file doesn't exist so the daemon always has sensible defaults.
/// Parsed configs are validated before being handed back.
pub fn load(path: impl AsRef<Path>) -> Result<WattcastConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(WattcastConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| ForecastError::Config(format!("cannot read '{}': {e}", path.display())))?;

    let config: WattcastConfig =
        toml::from_str(&raw).map_err(|e| ForecastError::Config(format!("TOML parse error: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Return the default config path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("wattcast").join("wattcast.toml")
}
