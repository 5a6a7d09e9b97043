//! EMG-Core: Foundation types for EMG fatigue analysis
//!
//! Recording container, sampling-rate inference and the shared error type.

pub mod error;
pub mod sampling;
pub mod time_series;

pub use error::{EmgError, EmgResult};
pub use sampling::{
    infer_sampling_rate, infer_sampling_rate_with, infer_timing, SamplingRate, TimingStats,
    MIN_VALID_DELTAS,
};
pub use time_series::{TimeSeries, MICROS_TO_SECS};
pub use uuid::Uuid;
