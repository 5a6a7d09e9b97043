//! Synthetic EMG recording generator
//!
//! Produces a [`TimeSeries`] in the same shape as an acquisition export:
//! microsecond timestamps (optionally jittered or duplicated) and a filtered
//! amplitude column built from tones, an activation envelope and noise.

use crate::signal_patterns::SignalPattern;
use emg_core::{EmgError, EmgResult, SamplingRate, TimeSeries};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// One sinusoidal component of the carrier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    /// Frequency at t = 0 (Hz)
    pub frequency_hz: f64,
    pub amplitude: f64,
}

/// Additive noise and interference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Gaussian noise standard deviation (0.0 = no noise)
    pub gaussian_std: f64,
    /// Constant offset added to every sample
    pub dc_offset: f64,
    /// Power line interference frequency, if any
    pub powerline_freq: Option<f64>,
    /// Power line interference amplitude
    pub powerline_amplitude: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            gaussian_std: 0.0,
            dc_offset: 0.0,
            powerline_freq: None,
            powerline_amplitude: 0.05,
        }
    }
}

/// Acquisition timestamp imperfections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// First timestamp (µs)
    pub start_us: f64,
    /// Gaussian jitter on each timestamp (µs)
    pub jitter_std_us: f64,
    /// Probability that a timestamp repeats the previous one
    pub duplicate_prob: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            start_us: 0.0,
            jitter_std_us: 0.0,
            duplicate_prob: 0.0,
        }
    }
}

/// Configuration for a synthetic recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Sampling rate in Hz
    pub sampling_rate: f64,
    /// Recording length in seconds
    pub duration_s: f64,
    /// Carrier components
    pub tones: Vec<Tone>,
    /// Linear frequency drift applied to every tone (Hz/s)
    pub frequency_drift_hz_per_s: f64,
    /// Activation envelope
    pub envelope: SignalPattern,
    pub noise: NoiseConfig,
    pub timing: TimingConfig,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl SimulationConfig {
    /// Noise-free single tone on an exact timestamp grid
    pub fn pure_tone(frequency_hz: f64, sampling_rate: f64, duration_s: f64) -> Self {
        Self {
            sampling_rate,
            duration_s,
            tones: vec![Tone { frequency_hz, amplitude: 1.0 }],
            frequency_drift_hz_per_s: 0.0,
            envelope: SignalPattern::default(),
            noise: NoiseConfig::default(),
            timing: TimingConfig::default(),
            seed: Some(0),
        }
    }

    /// Sustained contraction whose spectrum slides down over time
    pub fn fatiguing_contraction(sampling_rate: f64, duration_s: f64) -> Self {
        Self {
            sampling_rate,
            duration_s,
            tones: vec![
                Tone { frequency_hz: 90.0, amplitude: 1.0 },
                Tone { frequency_hz: 140.0, amplitude: 0.6 },
                Tone { frequency_hz: 210.0, amplitude: 0.3 },
            ],
            frequency_drift_hz_per_s: -2.0,
            envelope: SignalPattern::Constant { level: 1.0 },
            noise: NoiseConfig {
                gaussian_std: 0.05,
                ..NoiseConfig::default()
            },
            timing: TimingConfig::default(),
            seed: Some(42),
        }
    }

    /// Number of samples the recording will contain
    pub fn sample_count(&self) -> usize {
        (self.duration_s * self.sampling_rate).round().max(0.0) as usize
    }

    /// Validate the configuration
    pub fn validate(&self) -> EmgResult<()> {
        SamplingRate::new(self.sampling_rate)?;
        if !self.duration_s.is_finite() || self.duration_s <= 0.0 {
            return Err(EmgError::config("Duration must be positive"));
        }
        if !self.noise.gaussian_std.is_finite() || self.noise.gaussian_std < 0.0 {
            return Err(EmgError::config("Noise standard deviation must be non-negative"));
        }
        if !self.timing.jitter_std_us.is_finite() || self.timing.jitter_std_us < 0.0 {
            return Err(EmgError::config("Timestamp jitter must be non-negative"));
        }
        if !(0.0..=1.0).contains(&self.timing.duplicate_prob) {
            return Err(EmgError::config("Duplicate probability must be between 0.0 and 1.0"));
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::fatiguing_contraction(2000.0, 10.0)
    }
}

/// EMG recording simulator
pub struct EmgSimulator {
    config: SimulationConfig,
    rng: StdRng,
    noise_dist: Normal<f64>,
    jitter_dist: Normal<f64>,
}

impl EmgSimulator {
    /// Create new simulator with configuration
    pub fn new(config: SimulationConfig) -> EmgResult<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let noise_dist = Normal::new(0.0, config.noise.gaussian_std)
            .map_err(|e| EmgError::config(format!("Invalid noise distribution: {}", e)))?;
        let jitter_dist = Normal::new(0.0, config.timing.jitter_std_us)
            .map_err(|e| EmgError::config(format!("Invalid jitter distribution: {}", e)))?;

        Ok(EmgSimulator {
            config,
            rng,
            noise_dist,
            jitter_dist,
        })
    }

    /// Get current configuration
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Generate the recording
    pub fn generate(&mut self) -> EmgResult<TimeSeries> {
        let n = self.config.sample_count();
        let dt = 1.0 / self.config.sampling_rate;
        let step_us = 1e6 / self.config.sampling_rate;

        let mut timestamps = Vec::with_capacity(n);
        let mut samples = Vec::with_capacity(n);

        for i in 0..n {
            let time = i as f64 * dt;
            let sample = self.carrier(time) + self.noise(time);
            samples.push(sample);

            let mut stamp = self.config.timing.start_us + i as f64 * step_us;
            if self.config.timing.jitter_std_us > 0.0 {
                stamp += self.jitter_dist.sample(&mut self.rng);
            }
            if i > 0
                && self.config.timing.duplicate_prob > 0.0
                && self.rng.gen::<f64>() < self.config.timing.duplicate_prob
            {
                stamp = timestamps[i - 1];
            }
            timestamps.push(stamp);
        }

        debug!(samples = n, fs_hz = self.config.sampling_rate, "Generated synthetic recording");
        TimeSeries::new(timestamps, samples)
    }

    /// Enveloped sum of drifting tones
    fn carrier(&self, time: f64) -> f64 {
        let activation = self.config.envelope.activation_at_time(time);
        let drift = self.config.frequency_drift_hz_per_s;

        let value: f64 = self
            .config
            .tones
            .iter()
            .map(|tone| {
                // phase is the integral of the drifting instantaneous frequency
                let phase = 2.0 * PI * (tone.frequency_hz * time + 0.5 * drift * time * time);
                tone.amplitude * phase.sin()
            })
            .sum();

        activation * value
    }

    fn noise(&mut self, time: f64) -> f64 {
        let noise = &self.config.noise;
        let mut value = noise.dc_offset;

        if noise.gaussian_std > 0.0 {
            value += self.noise_dist.sample(&mut self.rng);
        }
        if let Some(freq) = noise.powerline_freq {
            value += noise.powerline_amplitude * (2.0 * PI * freq * time).sin();
        }

        value
    }
}

/// Generate a recording in one call
pub fn simulate(config: SimulationConfig) -> EmgResult<TimeSeries> {
    EmgSimulator::new(config)?.generate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_tone_grid() {
        let series = simulate(SimulationConfig::pure_tone(100.0, 2000.0, 1.0)).unwrap();
        assert_eq!(series.len(), 2000);
        assert_eq!(series.timestamps_us()[1], 500.0);
        assert_eq!(series.timestamps_us()[1999], 1999.0 * 500.0);

        let peak = series.samples().iter().fold(0.0f64, |a, b| a.max(b.abs()));
        assert!(peak <= 1.0 + 1e-12);
        assert!(peak > 0.99);
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let config = SimulationConfig::fatiguing_contraction(1000.0, 1.0);
        let a = simulate(config.clone()).unwrap();
        let b = simulate(config).unwrap();
        assert_eq!(a.samples(), b.samples());
        assert_eq!(a.timestamps_us(), b.timestamps_us());
    }

    #[test]
    fn test_dc_offset() {
        let mut config = SimulationConfig::pure_tone(50.0, 1000.0, 1.0);
        config.noise.dc_offset = 3.0;
        let series = simulate(config).unwrap();
        assert!((series.mean() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_timestamps() {
        let mut config = SimulationConfig::pure_tone(50.0, 1000.0, 1.0);
        config.timing.duplicate_prob = 0.2;
        let series = simulate(config).unwrap();

        let duplicates = series
            .timestamps_us()
            .windows(2)
            .filter(|w| w[1] == w[0])
            .count();
        assert!(duplicates > 100 && duplicates < 300, "duplicates {}", duplicates);
    }

    #[test]
    fn test_jittered_timestamps_stay_close() {
        let mut config = SimulationConfig::pure_tone(50.0, 1000.0, 1.0);
        config.timing.jitter_std_us = 5.0;
        let series = simulate(config).unwrap();

        for (i, t) in series.timestamps_us().iter().enumerate() {
            assert!((t - i as f64 * 1000.0).abs() < 50.0);
        }
    }

    #[test]
    fn test_envelope_scales_amplitude() {
        let mut config = SimulationConfig::pure_tone(50.0, 1000.0, 1.0);
        config.envelope = SignalPattern::Constant { level: 0.25 };
        let series = simulate(config).unwrap();
        let peak = series.samples().iter().fold(0.0f64, |a, b| a.max(b.abs()));
        assert!(peak <= 0.25 + 1e-12);
    }

    #[test]
    fn test_invalid_config() {
        let mut config = SimulationConfig::pure_tone(50.0, 1000.0, 1.0);
        config.sampling_rate = 0.0;
        assert!(EmgSimulator::new(config).is_err());

        let mut config = SimulationConfig::pure_tone(50.0, 1000.0, 1.0);
        config.duration_s = -1.0;
        assert!(EmgSimulator::new(config).is_err());

        let mut config = SimulationConfig::pure_tone(50.0, 1000.0, 1.0);
        config.noise.gaussian_std = -1.0;
        assert!(EmgSimulator::new(config).is_err());

        let mut config = SimulationConfig::pure_tone(50.0, 1000.0, 1.0);
        config.noise.gaussian_std = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::pure_tone(50.0, 1000.0, 1.0);
        config.timing.jitter_std_us = -5.0;
        assert!(EmgSimulator::new(config).is_err());
    }
}
