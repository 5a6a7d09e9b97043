//! Sampling rate inference from irregular acquisition timestamps
//!
//! Acquisition boards drop or duplicate samples now and then, so the rate is
//! taken from the median timestamp step rather than the mean.

use crate::error::{EmgError, EmgResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Minimum number of valid timestamp deltas needed for inference
pub const MIN_VALID_DELTAS: usize = 10;

/// Sampling frequency in Hz, always finite and positive
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct SamplingRate(f64);

impl SamplingRate {
    /// Wrap a rate in Hz
    pub fn new(hz: f64) -> EmgResult<Self> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(EmgError::InvalidSamplingRate { rate: hz });
        }
        Ok(SamplingRate(hz))
    }

    /// Rate in Hz
    pub fn hz(self) -> f64 {
        self.0
    }

    /// Sampling period in seconds
    pub fn period_s(self) -> f64 {
        1.0 / self.0
    }
}

impl TryFrom<f64> for SamplingRate {
    type Error = EmgError;

    fn try_from(hz: f64) -> EmgResult<Self> {
        SamplingRate::new(hz)
    }
}

impl From<SamplingRate> for f64 {
    fn from(rate: SamplingRate) -> f64 {
        rate.0
    }
}

impl fmt::Display for SamplingRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} Hz", self.0)
    }
}

/// Timing diagnostics gathered while inferring the sampling rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingStats {
    /// Inferred sampling rate
    pub sampling_rate: SamplingRate,
    /// Median of the valid timestamp deltas (µs)
    pub median_delta_us: f64,
    /// Deltas that were finite and positive
    pub valid_deltas: usize,
    /// Deltas discarded as glitches, duplicates or reordering
    pub discarded_deltas: usize,
}

/// Infer the sampling rate from a microsecond timestamp column
pub fn infer_sampling_rate(timestamps_us: &[f64]) -> EmgResult<SamplingRate> {
    infer_timing(timestamps_us, MIN_VALID_DELTAS).map(|stats| stats.sampling_rate)
}

/// Infer the sampling rate with a custom minimum number of valid deltas
pub fn infer_sampling_rate_with(timestamps_us: &[f64], min_valid: usize) -> EmgResult<SamplingRate> {
    infer_timing(timestamps_us, min_valid).map(|stats| stats.sampling_rate)
}

/// Infer the sampling rate and report how clean the timestamp column was
pub fn infer_timing(timestamps_us: &[f64], min_valid: usize) -> EmgResult<TimingStats> {
    let total_deltas = timestamps_us.len().saturating_sub(1);

    let mut deltas: Vec<f64> = timestamps_us
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|dt| dt.is_finite() && *dt > 0.0)
        .collect();

    if deltas.len() < min_valid {
        return Err(EmgError::InsufficientData {
            valid: deltas.len(),
            required: min_valid,
        });
    }

    let median_delta_us = median(&mut deltas);
    // 1e6 / dt keeps exact grids exact (500 µs -> 2000 Hz)
    let sampling_rate = SamplingRate::new(1e6 / median_delta_us)?;

    let discarded_deltas = total_deltas - deltas.len();
    if discarded_deltas > 0 {
        warn!(
            discarded = discarded_deltas,
            total = total_deltas,
            "Discarded non-positive or non-finite timestamp deltas"
        );
    }
    info!(fs_hz = sampling_rate.hz(), median_delta_us, "Inferred sampling rate");

    Ok(TimingStats {
        sampling_rate,
        median_delta_us,
        valid_deltas: deltas.len(),
        discarded_deltas,
    })
}

/// Median of a non-empty slice; averages the middle pair for even lengths
fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        0.5 * (values[mid - 1] + values[mid])
    } else {
        values[mid]
    }
}
