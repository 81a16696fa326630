//! The wattcast event loop.
//!
//! Wires together all background tasks and owns the predictor:
//! - state feed listener (samples for the watched entity)
//! - update-interval ticker (periodic recompute)
//! - config file watcher (live reload on change)
//! - ctrl-c handler (graceful shutdown)
//!
//! Each accepted sample and each tick triggers a recompute; the fit runs on
//! a blocking worker so the cooperative loop is never stalled, and the result
//! is published on a `watch` channel and printed for display.

use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use wattcast_config::{load as load_config, ConfigWatcher, WattcastConfig};
use wattcast_core::{epoch_now, predictor, Forecaster, Message, QuarterHourPredictor, Result};
use wattcast_feed::StateFeed;

/// Round for display: the feed values are kW readings, three decimals is
/// watt resolution.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// One display line per prediction change.
fn display_line(name: &str, prediction: Option<f64>, unit: &str) -> String {
    match prediction {
        Some(v) => format!("{name}: {v:.3} {unit}"),
        None => format!("{name}: unavailable"),
    }
}

/// Run the daemon until ctrl-c.  Never returns otherwise.
pub async fn run(config_path: PathBuf) -> Result<()> {
    let config = load_config(&config_path)?;
    let (prediction_tx, _prediction_rx) = watch::channel(None);
    let mut daemon = Daemon::new(config, config_path, prediction_tx)?;

    let feed = StateFeed::new(
        daemon.config.feed.socket_path(),
        daemon.config.feed.entity_id.clone(),
    );
    let mut samples = feed.spawn_listener();
    let (_watcher, mut config_rx) = ConfigWatcher::spawn(daemon.config_path.clone());
    let mut ticker = make_ticker(daemon.config.predictor.update_interval_secs);

    info!(
        "Forecasting '{}' over {}s buckets",
        daemon.config.display_name(),
        daemon.config.predictor.bucket_length_secs
    );

    loop {
        let message = tokio::select! {
            Some(sample) = samples.recv() => Message::Sample(sample),
            _ = ticker.tick() => Message::UpdateCycle,
            Some(()) = config_rx.recv() => Message::ConfigReloaded,
            _ = tokio::signal::ctrl_c() => Message::Shutdown,
        };

        match message {
            Message::Sample(sample) => {
                daemon.predictor.on_sample(sample.timestamp, sample.value);
                daemon.recompute().await;
            }
            Message::UpdateCycle => daemon.recompute().await,
            Message::ConfigReloaded => {
                if daemon.reload() {
                    ticker = make_ticker(daemon.config.predictor.update_interval_secs);
                }
            }
            Message::Shutdown => {
                info!("Shutting down");
                return Ok(());
            }
        }
    }
}

fn make_ticker(update_interval_secs: u64) -> Interval {
    let mut ticker = interval(Duration::from_secs(update_interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// All mutable daemon state, owned by the event loop task.
struct Daemon {
    config: WattcastConfig,
    config_path: PathBuf,
    predictor: QuarterHourPredictor,
    prediction_tx: watch::Sender<Option<f64>>,
}

impl Daemon {
    fn new(
        config: WattcastConfig,
        config_path: PathBuf,
        prediction_tx: watch::Sender<Option<f64>>,
    ) -> Result<Self> {
        let predictor = QuarterHourPredictor::new(
            config.predictor.capacity,
            config.predictor.bucket_length_secs,
        )?;
        Ok(Self {
            config,
            config_path,
            predictor,
            prediction_tx,
        })
    }

    /// Fit over a snapshot on a blocking worker, then publish the result.
    async fn recompute(&mut self) {
        let snapshot = self.predictor.snapshot();
        let now = epoch_now();
        let bucket_length = self.predictor.bucket_length();

        let prediction =
            match tokio::task::spawn_blocking(move || predictor::predict(&snapshot, now, bucket_length))
                .await
            {
                Ok(p) => p,
                Err(e) => {
                    error!("Prediction worker failed: {e}");
                    return;
                }
            };

        let rounded = prediction.map(round3);
        let changed = self.prediction_tx.send_replace(rounded) != rounded;

        if changed {
            let line = display_line(&self.config.display_name(), rounded, &self.config.predictor.unit);
            info!("{line}");
            println!("{line}");
        } else {
            debug!("Prediction unchanged: {rounded:?}");
        }
    }

    /// Re-read the config file.  Returns `true` when the update interval
    /// changed and the caller must rebuild its ticker.
    fn reload(&mut self) -> bool {
        let fresh = match load_config(&self.config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Config reload failed: {e}");
                return false;
            }
        };

        let old = std::mem::replace(&mut self.config, fresh);
        info!("Config reloaded");

        if self.config.feed.entity_id != old.feed.entity_id
            || self.config.feed.socket_path() != old.feed.socket_path()
        {
            warn!("Feed settings changed; restart to apply them");
        }

        if self.config.predictor.capacity != old.predictor.capacity
            || self.config.predictor.bucket_length_secs != old.predictor.bucket_length_secs
        {
            // Validation already passed in load(), so this cannot fail.
            match QuarterHourPredictor::new(
                self.config.predictor.capacity,
                self.config.predictor.bucket_length_secs,
            ) {
                Ok(p) => {
                    warn!("Predictor parameters changed; buffered samples dropped");
                    self.predictor = p;
                }
                Err(e) => error!("Cannot rebuild predictor: {e}"),
            }
        }

        self.config.predictor.update_interval_secs != old.predictor.update_interval_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wattcast_core::predictor::bucket_bounds;

    #[test]
    fn round3_is_three_decimals() {
        assert_eq!(round3(1.23456), 1.235);
        assert_eq!(round3(100.0004), 100.0);
        assert_eq!(round3(-0.0005), -0.001);
    }

    #[test]
    fn display_line_formats_rounded_value() {
        assert_eq!(
            display_line("house demand", Some(12.3456), "kW"),
            "house demand: 12.346 kW"
        );
        assert_eq!(display_line("house demand", None, "kW"), "house demand: unavailable");
    }

    fn test_daemon() -> (Daemon, watch::Receiver<Option<f64>>) {
        let (tx, rx) = watch::channel(None);
        let daemon = Daemon::new(WattcastConfig::default(), PathBuf::new(), tx).unwrap();
        (daemon, rx)
    }

    #[tokio::test]
    async fn recompute_publishes_none_without_data() {
        let (mut daemon, rx) = test_daemon();
        daemon.recompute().await;
        assert_eq!(*rx.borrow(), None);
    }

    #[tokio::test]
    async fn recompute_publishes_rounded_prediction() {
        let (mut daemon, rx) = test_daemon();

        // Two samples on a line inside the current bucket: 1.0 at bucket
        // start, 2.0 at mid-bucket → 3.0 at bucket end.
        let (start, end) = bucket_bounds(epoch_now(), 900.0);
        daemon.predictor.on_sample(start, 1.0);
        daemon.predictor.on_sample((start + end) / 2.0, 2.0);

        daemon.recompute().await;
        let got = rx.borrow().expect("prediction should be present");
        assert!((got - 3.0).abs() < 1e-6, "got {got}");
    }
}
