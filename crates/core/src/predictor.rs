//! Quarter-hour demand prediction.
//!
//! The predictor looks at the samples that fall inside the current aligned
//! quarter-hour, fits a line through them by least squares, and evaluates that
//! line at the instant the quarter-hour ends.

use crate::sample::{Sample, SampleBuffer};
use crate::Result;

/// Default buffer capacity: one reading per second for 15 minutes.
pub const DEFAULT_CAPACITY: usize = 900;

/// Default bucket length in seconds (one quarter-hour).
pub const DEFAULT_BUCKET_SECS: f64 = 900.0;

/// Host-integration seam: the shim that owns the event loop drives a
/// forecaster through these two calls.
pub trait Forecaster {
    /// A fresh reading arrived from the feed.
    fn on_sample(&mut self, timestamp: f64, value: f64);

    /// One update cycle: predict the value at the end of the bucket
    /// containing `now`, or `None` when there is not enough data.
    fn on_update_cycle(&mut self, now: f64) -> Option<f64>;
}

/// `[start, end)` of the fixed-length bucket containing `now`.
pub fn bucket_bounds(now: f64, bucket_length: f64) -> (f64, f64) {
    let start = now - (now % bucket_length);
    (start, start + bucket_length)
}

/// Least-squares degree-1 fit over `(timestamp, value)` pairs.
///
/// Returns the slope/intercept pair `(m, b)` of `value ≈ m * timestamp + b`,
/// or `None` when fewer than 2 points are given or all timestamps coincide
/// (zero time variance makes the slope undefined).
///
/// Computed in mean-centered form: equivalent to the textbook
/// `m = (nΣxy − ΣxΣy) / (nΣx² − (Σx)²)` but epoch timestamps squared would
/// throw away most of the f64 mantissa.
pub fn linear_fit(samples: &[Sample]) -> Option<(f64, f64)> {
    let n = samples.len();
    if n < 2 {
        return None;
    }

    let n_f = n as f64;
    let x_mean = samples.iter().map(|s| s.timestamp).sum::<f64>() / n_f;
    let y_mean = samples.iter().map(|s| s.value).sum::<f64>() / n_f;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for s in samples {
        let dx = s.timestamp - x_mean;
        sxy += dx * (s.value - y_mean);
        sxx += dx * dx;
    }

    if sxx == 0.0 {
        return None; // degenerate: every sample at the same instant
    }

    let m = sxy / sxx;
    let b = y_mean - m * x_mean;
    Some((m, b))
}

/// Pure prediction over one immutable snapshot.
///
/// Filters the snapshot to the half-open bucket `[start, end)` containing
/// `now`, fits a line through what remains, and evaluates it at `end`.
/// Deterministic for a given snapshot, `now`, and `bucket_length`; never
/// panics and never returns NaN.
pub fn predict(snapshot: &[Sample], now: f64, bucket_length: f64) -> Option<f64> {
    if snapshot.is_empty() {
        return None;
    }

    let (start, end) = bucket_bounds(now, bucket_length);

    // Half-open: a sample stamped exactly `end` belongs to the next bucket.
    let in_bucket: Vec<Sample> = snapshot
        .iter()
        .filter(|s| s.timestamp >= start && s.timestamp < end)
        .copied()
        .collect();

    if in_bucket.len() < 2 {
        return None;
    }

    let (m, b) = linear_fit(&in_bucket)?;
    Some(m * end + b)
}

/// A sample buffer plus the bucket length it is predicted over.
///
/// One instance per watched entity; the buffer is owned here and mutated
/// only through [`Forecaster::on_sample`].
#[derive(Debug)]
pub struct QuarterHourPredictor {
    buffer: SampleBuffer,
    bucket_length: f64,
}

impl QuarterHourPredictor {
    pub fn new(capacity: usize, bucket_length: f64) -> Result<Self> {
        if !(bucket_length > 0.0) {
            return Err(crate::ForecastError::Config(format!(
                "bucket length must be positive, got {bucket_length}"
            )));
        }
        Ok(Self {
            buffer: SampleBuffer::new(capacity)?,
            bucket_length,
        })
    }

    pub fn bucket_length(&self) -> f64 {
        self.bucket_length
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    /// Owned copy of the buffer for an off-thread fit.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Sample> {
        self.buffer.snapshot()
    }
}

impl Forecaster for QuarterHourPredictor {
    fn on_sample(&mut self, timestamp: f64, value: f64) {
        self.buffer.push(Sample::new(timestamp, value));
    }

    fn on_update_cycle(&mut self, now: f64) -> Option<f64> {
        predict(&self.snapshot(), now, self.bucket_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(pairs: &[(f64, f64)]) -> Vec<Sample> {
        pairs.iter().map(|&(t, v)| Sample::new(t, v)).collect()
    }

    #[test]
    fn empty_snapshot_gives_none() {
        assert_eq!(predict(&[], 300.0, 900.0), None);
    }

    #[test]
    fn single_sample_gives_none_for_any_now() {
        let snap = samples(&[(100.0, 42.0)]);
        for now in [0.0, 100.0, 450.0, 899.0, 10_000.0] {
            assert_eq!(predict(&snap, now, 900.0), None);
        }
    }

    #[test]
    fn sample_outside_bucket_gives_none() {
        // now=300 → bucket [0, 900); a sample at 905 is the next bucket's.
        let snap = samples(&[(905.0, 5.0)]);
        assert_eq!(predict(&snap, 300.0, 900.0), None);
    }

    #[test]
    fn known_line_extrapolates_to_bucket_end() {
        // y = 0.1 x + 10 → at bucket end 900 the line reads 100.
        let snap = samples(&[(0.0, 10.0), (100.0, 20.0), (200.0, 30.0)]);
        let p = predict(&snap, 300.0, 900.0).unwrap();
        assert!((p - 100.0).abs() < 1e-9, "got {p}");
    }

    #[test]
    fn exact_line_is_recovered_exactly() {
        let (m0, b0) = (-2.5, 1_000.0);
        let snap: Vec<Sample> = [10.0, 55.0, 200.0, 623.0, 899.0]
            .iter()
            .map(|&t| Sample::new(t, m0 * t + b0))
            .collect();
        let p = predict(&snap, 500.0, 900.0).unwrap();
        assert!((p - (m0 * 900.0 + b0)).abs() < 1e-6, "got {p}");
    }

    #[test]
    fn fit_survives_epoch_scale_timestamps() {
        // Realistic timestamps (~1.7e9 s); the centered fit must not lose
        // the slope to cancellation.
        let start = 1_756_400_400.0; // aligned to 900
        let snap: Vec<Sample> = (0..10)
            .map(|i| Sample::new(start + i as f64 * 60.0, 5.0 + i as f64 * 0.25))
            .collect();
        let now = start + 600.0;
        let p = predict(&snap, now, 900.0).unwrap();
        // slope 0.25/60 per second, evaluated at start+900
        let expected = 5.0 + (900.0 / 60.0) * 0.25;
        assert!((p - expected).abs() < 1e-6, "got {p}, want {expected}");
    }

    #[test]
    fn bucket_start_included_bucket_end_excluded() {
        // Two in-bucket points on a line, plus a decoy exactly at bucket end
        // that would drag the fit if it leaked in.
        let snap = samples(&[(0.0, 0.0), (450.0, 45.0), (900.0, 9_999.0)]);
        let p = predict(&snap, 10.0, 900.0).unwrap();
        assert!((p - 90.0).abs() < 1e-9, "end-boundary sample leaked: {p}");

        // Sample exactly at bucket start participates.
        let snap = samples(&[(900.0, 90.0), (1350.0, 135.0)]);
        let p = predict(&snap, 900.0, 900.0).unwrap();
        assert!((p - 180.0).abs() < 1e-9, "got {p}");
    }

    #[test]
    fn fresh_bucket_instant_has_no_carryover() {
        // now == bucket_start: everything from the previous bucket is out.
        let snap = samples(&[(100.0, 1.0), (500.0, 2.0), (899.9, 3.0)]);
        assert_eq!(predict(&snap, 900.0, 900.0), None);
    }

    #[test]
    fn degenerate_timestamps_give_none_not_nan() {
        let snap = samples(&[(450.0, 1.0), (450.0, 2.0), (450.0, 3.0)]);
        assert_eq!(predict(&snap, 500.0, 900.0), None);
    }

    #[test]
    fn predict_is_idempotent() {
        let snap = samples(&[(10.0, 3.0), (20.0, 7.0), (30.0, 4.0), (40.0, 9.0)]);
        let a = predict(&snap, 100.0, 900.0);
        let b = predict(&snap, 100.0, 900.0);
        assert_eq!(a, b);
        assert!(a.is_some());
    }

    #[test]
    fn unordered_snapshot_fits_the_same_line() {
        let ordered = samples(&[(0.0, 10.0), (100.0, 20.0), (200.0, 30.0)]);
        let shuffled = samples(&[(200.0, 30.0), (0.0, 10.0), (100.0, 20.0)]);
        assert_eq!(
            predict(&ordered, 300.0, 900.0),
            predict(&shuffled, 300.0, 900.0)
        );
    }

    #[test]
    fn linear_fit_matches_closed_form() {
        let snap = samples(&[(1.0, 2.0), (2.0, 3.5), (3.0, 6.0), (4.0, 7.5)]);
        let (m, b) = linear_fit(&snap).unwrap();
        // Textbook normal equations on the same points.
        let n = 4.0;
        let (sx, sy) = (10.0, 19.0);
        let sxy: f64 = snap.iter().map(|s| s.timestamp * s.value).sum();
        let sxx: f64 = snap.iter().map(|s| s.timestamp * s.timestamp).sum();
        let m_ref = (n * sxy - sx * sy) / (n * sxx - sx * sx);
        let b_ref = (sy - m_ref * sx) / n;
        assert!((m - m_ref).abs() < 1e-12);
        assert!((b - b_ref).abs() < 1e-12);
    }

    #[test]
    fn bucket_bounds_align_to_length() {
        let (s, e) = bucket_bounds(1_756_400_999.0, 900.0);
        assert_eq!(s, 1_756_400_400.0);
        assert_eq!(e, 1_756_401_300.0);
        assert_eq!(bucket_bounds(0.0, 900.0), (0.0, 900.0));
        assert_eq!(bucket_bounds(900.0, 900.0), (900.0, 1800.0));
    }

    #[test]
    fn predictor_rejects_bad_bucket_length() {
        assert!(QuarterHourPredictor::new(10, 0.0).is_err());
        assert!(QuarterHourPredictor::new(10, -900.0).is_err());
    }

    #[test]
    fn forecaster_roundtrip() {
        let mut p = QuarterHourPredictor::new(DEFAULT_CAPACITY, DEFAULT_BUCKET_SECS).unwrap();
        p.on_sample(0.0, 10.0);
        assert_eq!(p.on_update_cycle(300.0), None);
        p.on_sample(100.0, 20.0);
        p.on_sample(200.0, 30.0);
        let got = p.on_update_cycle(300.0).unwrap();
        assert!((got - 100.0).abs() < 1e-9);
    }
}
