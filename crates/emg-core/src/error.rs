//! Error handling for the EMG fatigue analysis workspace
//!
//! Only a handful of conditions are real failures; degenerate spectra and
//! empty frequency bands are handled numerically by the feature code and never
//! surface here.

use thiserror::Error;

/// Result type alias for EMG analysis operations
pub type EmgResult<T> = Result<T, EmgError>;

/// Error type shared by all EMG analysis crates
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum EmgError {
    /// Too few usable timestamp deltas to infer a sampling rate
    #[error("Insufficient data: {valid} valid timestamp deltas, at least {required} required")]
    InsufficientData {
        /// Number of finite, positive deltas found
        valid: usize,
        /// Minimum number of deltas required
        required: usize,
    },

    /// Timestamp and sample columns differ in length
    #[error("Mismatched columns: {timestamps} timestamps vs {samples} samples")]
    MismatchedColumns {
        timestamps: usize,
        samples: usize,
    },

    /// Sampling rate is not a finite positive number
    #[error("Invalid sampling rate: {rate} Hz")]
    InvalidSamplingRate {
        rate: f64,
    },

    /// Frequency band with low >= high or non-finite edges
    #[error("Invalid frequency band: [{low}, {high}] Hz")]
    InvalidBand {
        low: f64,
        high: f64,
    },

    /// Analysis configuration rejected by validation
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },

    /// Spectral estimator could not honour its contract
    #[error("Spectral estimator error: {reason}")]
    Estimator {
        reason: String,
    },
}

impl EmgError {
    /// Shorthand for configuration errors
    pub fn config(reason: impl Into<String>) -> Self {
        EmgError::InvalidConfig { reason: reason.into() }
    }

    /// Shorthand for estimator errors
    pub fn estimator(reason: impl Into<String>) -> Self {
        EmgError::Estimator { reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = EmgError::InsufficientData { valid: 3, required: 10 };
        let display = format!("{}", error);
        assert!(display.contains("Insufficient data"));
        assert!(display.contains('3'));
        assert!(display.contains("10"));
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(EmgError::config("bad overlap"), EmgError::config("bad overlap"));
        assert_ne!(EmgError::config("a"), EmgError::estimator("a"));
    }
}
