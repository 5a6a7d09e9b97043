//! Configuration management for fatigue analysis

use crate::spectral::{BandDefinition, WelchParams};
use emg_core::{EmgError, EmgResult, SamplingRate, MIN_VALID_DELTAS};
use serde::{Deserialize, Serialize};

/// Complete set of analysis constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Band used for MNF/MDF/peak, band power and spectral entropy
    pub analysis_band: BandDefinition,
    /// Sub-bands for the power ratios
    pub sub_bands: SubBands,
    /// Sliding window parameters
    pub window: WindowConfig,
    /// Two-tier Welch segment length rule
    pub segments: SegmentPolicy,
    /// Zero-crossing threshold as a fraction of the segment standard deviation
    pub zc_threshold_ratio: f64,
    /// In-band PSD values at or below this magnitude count as no power
    pub degenerate_power_atol: f64,
    /// Minimum valid timestamp deltas for sampling-rate inference
    pub min_valid_deltas: usize,
}

/// Low/mid/high sub-bands and the full EMG band used for ratios
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubBands {
    pub low: BandDefinition,
    pub mid: BandDefinition,
    pub high: BandDefinition,
    pub full: BandDefinition,
}

/// Sliding window duration and overlap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window duration in seconds
    pub duration_s: f64,
    /// Fraction of the window shared with the next one, in [0, 1)
    pub overlap: f64,
}

/// Welch segment length chosen by sampling rate
///
/// Keeps the segment duration (and so the spectral resolution) comparable
/// between 1 kHz and 2 kHz recordings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentPolicy {
    /// Rates at or above this use the high-rate segment lengths
    pub rate_threshold_hz: f64,
    /// Whole-recording segment length at high / low rate
    pub whole_signal: SegmentTiers,
    /// Per-window segment length at high / low rate
    pub per_window: SegmentTiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentTiers {
    pub high_rate: usize,
    pub low_rate: usize,
}

impl SegmentTiers {
    fn nominal(&self, fs: SamplingRate, threshold_hz: f64) -> usize {
        if fs.hz() >= threshold_hz {
            self.high_rate
        } else {
            self.low_rate
        }
    }
}

impl SegmentPolicy {
    /// Welch parameters for the whole recording of `len` samples
    pub fn whole_signal_params(&self, fs: SamplingRate, len: usize) -> WelchParams {
        WelchParams::for_signal(self.whole_signal.nominal(fs, self.rate_threshold_hz), len)
    }

    /// Welch parameters for one analysis window of `len` samples
    pub fn window_params(&self, fs: SamplingRate, len: usize) -> WelchParams {
        WelchParams::for_signal(self.per_window.nominal(fs, self.rate_threshold_hz), len)
    }
}

impl SubBands {
    /// Conventional surface EMG sub-bands
    pub fn surface_emg() -> Self {
        SubBands {
            low: band(20.0, 60.0),
            mid: band(60.0, 150.0),
            high: band(150.0, 450.0),
            full: band(20.0, 450.0),
        }
    }
}

/// Preset configurations
impl AnalysisConfig {
    /// Surface EMG defaults: 20–450 Hz, 250 ms windows at 75% overlap
    pub fn surface_emg() -> Self {
        AnalysisConfig {
            analysis_band: band(20.0, 450.0),
            sub_bands: SubBands::surface_emg(),
            window: WindowConfig {
                duration_s: 0.25,
                overlap: 0.75,
            },
            segments: SegmentPolicy {
                rate_threshold_hz: 1500.0,
                whole_signal: SegmentTiers { high_rate: 1024, low_rate: 512 },
                per_window: SegmentTiers { high_rate: 512, low_rate: 256 },
            },
            zc_threshold_ratio: 0.01,
            degenerate_power_atol: 1e-8,
            min_valid_deltas: MIN_VALID_DELTAS,
        }
    }

    /// Longer windows and segments for finer frequency resolution
    pub fn high_resolution() -> Self {
        let mut config = Self::surface_emg();
        config.window.duration_s = 0.5;
        config.segments.whole_signal = SegmentTiers { high_rate: 2048, low_rate: 1024 };
        config.segments.per_window = SegmentTiers { high_rate: 1024, low_rate: 512 };
        config
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> EmgResult<()> {
        let window = &self.window;
        if !window.duration_s.is_finite() || window.duration_s <= 0.0 {
            return Err(EmgError::config("Window duration must be positive"));
        }
        if !(0.0..1.0).contains(&window.overlap) {
            return Err(EmgError::config("Window overlap must be in [0, 1)"));
        }

        let segments = &self.segments;
        if !segments.rate_threshold_hz.is_finite() || segments.rate_threshold_hz <= 0.0 {
            return Err(EmgError::config("Segment rate threshold must be positive"));
        }
        for tiers in [segments.whole_signal, segments.per_window] {
            if tiers.high_rate == 0 || tiers.low_rate == 0 {
                return Err(EmgError::config("Segment lengths must be greater than 0"));
            }
        }

        if !self.zc_threshold_ratio.is_finite() || self.zc_threshold_ratio < 0.0 {
            return Err(EmgError::config("Zero-crossing threshold ratio must be non-negative"));
        }
        if !self.degenerate_power_atol.is_finite() || self.degenerate_power_atol < 0.0 {
            return Err(EmgError::config("Degenerate power tolerance must be non-negative"));
        }
        if self.min_valid_deltas == 0 {
            return Err(EmgError::config("At least one valid timestamp delta is required"));
        }

        Ok(())
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> EmgResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EmgError::config(format!("Failed to serialize configuration: {}", e)))
    }

    /// Import configuration from JSON
    pub fn from_json(json: &str) -> EmgResult<Self> {
        let config: AnalysisConfig = serde_json::from_str(json)
            .map_err(|e| EmgError::config(format!("Failed to deserialize configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::surface_emg()
    }
}

const fn band(low: f64, high: f64) -> BandDefinition {
    BandDefinition::preset(low, high)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_emg_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config, AnalysisConfig::surface_emg());
        assert_eq!(config.analysis_band.low(), 20.0);
        assert_eq!(config.analysis_band.high(), 450.0);
        assert_eq!(config.window.duration_s, 0.25);
        assert_eq!(config.window.overlap, 0.75);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_high_resolution_config() {
        let config = AnalysisConfig::high_resolution();
        assert_eq!(config.window.duration_s, 0.5);
        assert_eq!(config.segments.per_window.high_rate, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_segment_tiers() {
        let config = AnalysisConfig::surface_emg();
        let fast = SamplingRate::new(2000.0).unwrap();
        let slow = SamplingRate::new(1000.0).unwrap();

        let whole = config.segments.whole_signal_params(fast, 10_000);
        assert_eq!((whole.nperseg, whole.noverlap), (1024, 512));
        let whole = config.segments.whole_signal_params(slow, 10_000);
        assert_eq!((whole.nperseg, whole.noverlap), (512, 256));

        let window = config.segments.window_params(fast, 500);
        assert_eq!((window.nperseg, window.noverlap), (500, 256));
        let window = config.segments.window_params(slow, 250);
        assert_eq!((window.nperseg, window.noverlap), (250, 128));

        // threshold is inclusive
        let edge = SamplingRate::new(1500.0).unwrap();
        assert_eq!(config.segments.window_params(edge, 10_000).nperseg, 512);
    }

    #[test]
    fn test_config_validation() {
        let mut config = AnalysisConfig::surface_emg();

        config.window.overlap = 1.0;
        assert!(config.validate().is_err());

        config.window.overlap = 0.5;
        config.window.duration_s = 0.0;
        assert!(config.validate().is_err());

        config.window.duration_s = 0.25;
        config.segments.per_window.low_rate = 0;
        assert!(config.validate().is_err());

        config.segments.per_window.low_rate = 256;
        config.min_valid_deltas = 0;
        assert!(config.validate().is_err());

        config.min_valid_deltas = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_serialization() {
        let config = AnalysisConfig::high_resolution();
        let json = config.to_json().unwrap();
        assert!(json.contains("analysis_band"));

        let restored = AnalysisConfig::from_json(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn test_json_rejects_inverted_band() {
        let json = AnalysisConfig::surface_emg().to_json().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["analysis_band"] = serde_json::json!([450.0, 20.0]);
        assert!(AnalysisConfig::from_json(&value.to_string()).is_err());
    }
}
