use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use wattcast_core::{ForecastError, Result};

/// Root configuration structure parsed from `wattcast.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WattcastConfig {
    /// Optional display name; defaults to `"<entity_id> prediction"`.
    pub name: Option<String>,
    /// Where samples come from.
    pub feed: FeedConfig,
    /// Prediction parameters.
    pub predictor: PredictorConfig,
}

impl WattcastConfig {
    /// Name used in log lines and display output.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{} prediction", self.feed.entity_id))
    }

    /// Reject values the predictor cannot run with. Fatal at startup.
    pub fn validate(&self) -> Result<()> {
        if self.predictor.capacity == 0 {
            return Err(ForecastError::Config(
                "predictor.capacity must be at least 1".into(),
            ));
        }
        if !(self.predictor.bucket_length_secs > 0.0) {
            return Err(ForecastError::Config(format!(
                "predictor.bucket_length_secs must be positive, got {}",
                self.predictor.bucket_length_secs
            )));
        }
        if self.predictor.update_interval_secs == 0 {
            return Err(ForecastError::Config(
                "predictor.update_interval_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Feed connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Entity whose state changes are sampled, e.g. `"sensor.avg_demand"`.
    pub entity_id: String,
    /// Unix socket the feed publisher listens on.
    /// `None` → `$XDG_RUNTIME_DIR/wattcast/feed.sock`.
    pub socket: Option<PathBuf>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            entity_id: "sensor.avg_demand".to_string(),
            socket: None,
        }
    }
}

impl FeedConfig {
    /// Resolved socket path, honouring `$XDG_RUNTIME_DIR`.
    pub fn socket_path(&self) -> PathBuf {
        self.socket.clone().unwrap_or_else(|| {
            let runtime_dir =
                std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/run/user/1000".to_string());
            PathBuf::from(runtime_dir).join("wattcast").join("feed.sock")
        })
    }
}

/// Prediction tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Sample buffer size. 900 ≈ one reading per second for 15 minutes.
    pub capacity: usize,
    /// Bucket length in seconds (default: one quarter-hour).
    pub bucket_length_secs: f64,
    /// How often the prediction is recomputed when no samples arrive.
    pub update_interval_secs: u64,
    /// Unit suffix for display output.
    pub unit: String,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            capacity: wattcast_core::predictor::DEFAULT_CAPACITY,
            bucket_length_secs: wattcast_core::predictor::DEFAULT_BUCKET_SECS,
            update_interval_secs: 15,
            unit: "kW".to_string(),
        }
    }
}
