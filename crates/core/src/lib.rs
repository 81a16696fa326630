pub mod error;
pub mod event;
pub mod predictor;
pub mod sample;

pub use error::{ForecastError, Result};
pub use event::Message;
pub use predictor::{Forecaster, QuarterHourPredictor};
pub use sample::{Sample, SampleBuffer};

/// Current wall-clock time as fractional seconds since the Unix epoch.
pub fn epoch_now() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1e6
}
