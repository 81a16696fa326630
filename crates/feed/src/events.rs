use serde::Deserialize;
use wattcast_core::{ForecastError, Result, Sample};

/// States that mean "no reading right now" rather than a number.
/// These are skipped quietly — they are normal during sensor startup.
const STATE_UNAVAILABLE: &str = "unavailable";
const STATE_UNKNOWN: &str = "unknown";

/// One state-change event as published on the feed socket, one JSON object
/// per line:
///
/// ```json
/// {"entity_id":"sensor.avg_demand","state":"42.517","last_updated":1756400000.0}
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct StateEvent {
    pub entity_id: String,
    /// Raw state string — numeric for real readings, or a sentinel like
    /// `"unavailable"` while the upstream sensor has nothing to report.
    pub state: String,
    /// Seconds since the Unix epoch at which the state last changed.
    pub last_updated: f64,
}

impl StateEvent {
    /// Convert the event into a buffer-ready sample.
    ///
    /// `Ok(None)` for unavailable/unknown sentinels (skip, not an error);
    /// `Err(Sample)` for states that should be numeric but aren't — those
    /// are logged and discarded at the boundary, never buffered.
    pub fn to_sample(&self) -> Result<Option<Sample>> {
        if self.state == STATE_UNAVAILABLE || self.state == STATE_UNKNOWN {
            return Ok(None);
        }

        let value: f64 = self.state.parse().map_err(|_| {
            ForecastError::Sample(format!(
                "state '{}' of {} is not numeric",
                self.state, self.entity_id
            ))
        })?;

        if !value.is_finite() {
            return Err(ForecastError::Sample(format!(
                "state '{}' of {} is not finite",
                self.state, self.entity_id
            )));
        }

        Ok(Some(Sample::new(self.last_updated, value)))
    }
}

/// Parse one raw feed line into a typed [`StateEvent`].
pub fn parse_line(line: &str) -> Result<StateEvent> {
    serde_json::from_str(line)
        .map_err(|e| ForecastError::Feed(format!("malformed feed line: {e}")))
}
