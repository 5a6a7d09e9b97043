//! EMG-Processing: Spectral fatigue analysis for surface EMG
//!
//! Welch PSD estimation, feature primitives, the whole-recording summary and
//! the sliding-window feature pipeline.

pub mod config;
pub mod pipeline;
pub mod primitives;
pub mod spectral;
pub mod summary;

pub use config::{AnalysisConfig, SegmentPolicy, SegmentTiers, SubBands, WindowConfig};
pub use pipeline::{
    window_features, windowed_features, AnalysisReport, FatiguePipeline, FeatureTable,
    FeatureVector, WindowLayout,
};
#[cfg(feature = "parallel")]
pub use pipeline::windowed_features_parallel;
pub use spectral::{
    BandDefinition, Detrend, PsdEstimator, Scaling, SpectralEstimate, Taper, WelchEstimator,
    WelchParams,
};
pub use summary::{summarize, WholeSignalSummary};
