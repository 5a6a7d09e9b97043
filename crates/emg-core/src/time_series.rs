//! TimeSeries: container for a single-channel EMG recording

use crate::error::{EmgError, EmgResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Microseconds to seconds
pub const MICROS_TO_SECS: f64 = 1e-6;

/// Single-channel recording as aligned (timestamp, sample) columns
///
/// Timestamps are in microseconds, in acquisition order. The series is
/// immutable once built; analysis stages borrow slices of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Unique identifier for this recording
    id: Uuid,
    /// Acquisition timestamps in microseconds
    timestamps_us: Vec<f64>,
    /// Filtered amplitude samples
    samples: Vec<f64>,
}

impl TimeSeries {
    /// Create a new series from aligned columns
    pub fn new(timestamps_us: Vec<f64>, samples: Vec<f64>) -> EmgResult<Self> {
        if timestamps_us.len() != samples.len() {
            return Err(EmgError::MismatchedColumns {
                timestamps: timestamps_us.len(),
                samples: samples.len(),
            });
        }

        Ok(TimeSeries {
            id: Uuid::new_v4(),
            timestamps_us,
            samples,
        })
    }

    /// Recording identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if series is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Timestamp column in microseconds
    pub fn timestamps_us(&self) -> &[f64] {
        &self.timestamps_us
    }

    /// Amplitude column
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Timestamp of sample `index` in seconds
    pub fn timestamp_s(&self, index: usize) -> Option<f64> {
        self.timestamps_us.get(index).map(|t| t * MICROS_TO_SECS)
    }

    /// Arithmetic mean of the samples (0.0 for an empty series)
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Samples with the mean removed
    pub fn dc_removed(&self) -> Vec<f64> {
        let mean = self.mean();
        self.samples.iter().map(|x| x - mean).collect()
    }

    /// Span between the first and last timestamp in seconds
    pub fn duration_s(&self) -> f64 {
        match (self.timestamps_us.first(), self.timestamps_us.last()) {
            (Some(first), Some(last)) => (last - first) * MICROS_TO_SECS,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_creation() {
        let series = TimeSeries::new(vec![0.0, 500.0, 1000.0], vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(series.len(), 3);
        assert!(!series.is_empty());
        assert_eq!(series.timestamp_s(1), Some(0.0005));
        assert_eq!(series.timestamp_s(3), None);
        assert!((series.duration_s() - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_mismatched_columns() {
        let result = TimeSeries::new(vec![0.0, 1.0], vec![1.0]);
        assert_eq!(
            result.unwrap_err(),
            EmgError::MismatchedColumns { timestamps: 2, samples: 1 }
        );
    }

    #[test]
    fn test_dc_removal() {
        let series = TimeSeries::new(vec![0.0; 4], vec![1.0, 3.0, 5.0, 7.0]).unwrap();
        assert_eq!(series.mean(), 4.0);
        assert_eq!(series.dc_removed(), vec![-3.0, -1.0, 1.0, 3.0]);
    }

    #[test]
    fn test_empty_series() {
        let series = TimeSeries::new(Vec::new(), Vec::new()).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.mean(), 0.0);
        assert_eq!(series.duration_s(), 0.0);
        assert!(series.dc_removed().is_empty());
    }
}
