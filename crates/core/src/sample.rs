use crate::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One reading from the demand feed: fractional seconds since the Unix epoch
/// paired with the sensor value (kW).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: f64,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Fixed-capacity FIFO buffer of recent samples.
///
/// Appending past capacity evicts the single oldest entry, so the buffer
/// always holds the `capacity` most recent readings in insertion order.
/// Owned exclusively by one predictor — one writer, one reader.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl SampleBuffer {
    /// Create a buffer holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ForecastError::Config(
                "sample buffer capacity must be at least 1".into(),
            ));
        }
        Ok(Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Append a sample, evicting the oldest entry if the buffer is full.
    /// Always succeeds; O(1) amortized.
    pub fn push(&mut self, sample: Sample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Owned copy of the current contents in insertion order.
    ///
    /// The fit runs over this copy, so appends landing between snapshot and
    /// fit never affect an in-flight computation.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
