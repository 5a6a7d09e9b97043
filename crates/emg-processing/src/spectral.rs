//! Power spectral density estimation
//!
//! The feature stages only see the [`PsdEstimator`] trait. [`WelchEstimator`]
//! is the bundled implementation: overlapping segments, periodic Hann taper,
//! per-segment mean removal, one-sided density-scaled periodograms averaged
//! across segments.

use emg_core::{EmgError, EmgResult, SamplingRate};
use realfft::num_complex::Complex;
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::trace;

/// Frequency band in Hz, inclusive on both edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "(f64, f64)", into = "(f64, f64)")]
pub struct BandDefinition {
    low: f64,
    high: f64,
}

impl BandDefinition {
    /// Create a band, requiring finite edges with `low < high`
    pub fn new(low: f64, high: f64) -> EmgResult<Self> {
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(EmgError::InvalidBand { low, high });
        }
        Ok(BandDefinition { low, high })
    }

    /// Band from literal edges already known to be ordered
    pub(crate) const fn preset(low: f64, high: f64) -> Self {
        BandDefinition { low, high }
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    /// Whether `frequency` falls inside the band
    #[inline]
    pub fn contains(&self, frequency: f64) -> bool {
        frequency >= self.low && frequency <= self.high
    }
}

impl TryFrom<(f64, f64)> for BandDefinition {
    type Error = EmgError;

    fn try_from((low, high): (f64, f64)) -> EmgResult<Self> {
        BandDefinition::new(low, high)
    }
}

impl From<BandDefinition> for (f64, f64) {
    fn from(band: BandDefinition) -> (f64, f64) {
        (band.low, band.high)
    }
}

/// Paired frequency/power arrays produced by a PSD estimator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectralEstimate {
    /// Bin frequencies in Hz, ascending
    pub frequencies: Vec<f64>,
    /// Power per bin, non-negative
    pub power: Vec<f64>,
}

impl SpectralEstimate {
    /// Pair frequency and power columns; they must have equal length
    pub fn new(frequencies: Vec<f64>, power: Vec<f64>) -> EmgResult<Self> {
        if frequencies.len() != power.len() {
            return Err(EmgError::estimator(format!(
                "frequency/power length mismatch: {} vs {}",
                frequencies.len(),
                power.len()
            )));
        }
        Ok(SpectralEstimate { frequencies, power })
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Bins whose frequency lies inside `band`
    pub fn restrict(&self, band: BandDefinition) -> SpectralEstimate {
        let (frequencies, power) = self
            .frequencies
            .iter()
            .zip(&self.power)
            .filter(|(f, _)| band.contains(**f))
            .map(|(f, p)| (*f, *p))
            .unzip();
        SpectralEstimate { frequencies, power }
    }
}

/// Tapering window applied to every segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Taper {
    /// Periodic Hann window
    Hann,
    /// No taper
    Rectangular,
}

/// Per-segment trend removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Detrend {
    /// Subtract the segment mean
    Constant,
    None,
}

/// Output scaling of the periodogram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scaling {
    /// Power spectral density (units²/Hz)
    Density,
    /// Power spectrum (units²)
    Spectrum,
}

/// Welch estimation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelchParams {
    /// Segment length in samples
    pub nperseg: usize,
    /// Samples shared by consecutive segments
    pub noverlap: usize,
    pub taper: Taper,
    pub detrend: Detrend,
    pub scaling: Scaling,
}

impl WelchParams {
    /// Hann taper, constant detrend, density scaling
    pub fn hann_density(nperseg: usize, noverlap: usize) -> Self {
        WelchParams {
            nperseg,
            noverlap,
            taper: Taper::Hann,
            detrend: Detrend::Constant,
            scaling: Scaling::Density,
        }
    }

    /// Derive parameters for a signal of `len` samples from a nominal segment
    /// length: the segment never exceeds the signal and the overlap is half
    /// the nominal length, capped at `len - 1`.
    pub fn for_signal(nominal_nperseg: usize, len: usize) -> Self {
        let nperseg = nominal_nperseg.min(len);
        let noverlap = (nominal_nperseg / 2).min(len.saturating_sub(1));
        Self::hann_density(nperseg, noverlap)
    }

    /// Check the parameters against a segment of `len` samples
    pub fn validate(&self, len: usize) -> EmgResult<()> {
        if self.nperseg == 0 {
            return Err(EmgError::estimator("nperseg must be at least 1"));
        }
        if self.nperseg > len {
            return Err(EmgError::estimator(format!(
                "nperseg {} exceeds segment length {}",
                self.nperseg, len
            )));
        }
        if self.noverlap >= self.nperseg {
            return Err(EmgError::estimator(format!(
                "noverlap {} must be less than nperseg {}",
                self.noverlap, self.nperseg
            )));
        }
        Ok(())
    }

    /// Number of segments averaged for a signal of `len` samples
    pub fn segment_count(&self, len: usize) -> usize {
        if self.nperseg == 0 || len < self.nperseg || self.noverlap >= self.nperseg {
            return 0;
        }
        (len - self.nperseg) / (self.nperseg - self.noverlap) + 1
    }
}

/// Capability that turns a segment into a spectral estimate
pub trait PsdEstimator {
    /// Estimate the one-sided PSD of `segment` sampled at `fs`
    fn estimate(
        &mut self,
        segment: &[f64],
        fs: SamplingRate,
        params: &WelchParams,
    ) -> EmgResult<SpectralEstimate>;
}

/// Welch's averaged-periodogram estimator backed by a real FFT
pub struct WelchEstimator {
    planner: RealFftPlanner<f64>,
}

impl WelchEstimator {
    pub fn new() -> Self {
        WelchEstimator {
            planner: RealFftPlanner::new(),
        }
    }
}

impl Default for WelchEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl PsdEstimator for WelchEstimator {
    fn estimate(
        &mut self,
        segment: &[f64],
        fs: SamplingRate,
        params: &WelchParams,
    ) -> EmgResult<SpectralEstimate> {
        params.validate(segment.len())?;

        let nperseg = params.nperseg;
        let step = nperseg - params.noverlap;
        let segments = params.segment_count(segment.len());

        let window = taper_window(params.taper, nperseg);
        let scale = match params.scaling {
            Scaling::Density => 1.0 / (fs.hz() * window.iter().map(|w| w * w).sum::<f64>()),
            Scaling::Spectrum => 1.0 / window.iter().sum::<f64>().powi(2),
        };

        let r2c = self.planner.plan_fft_forward(nperseg);
        let mut input = r2c.make_input_vec();
        let mut spectrum: Vec<Complex<f64>> = r2c.make_output_vec();
        let mut power = vec![0.0; spectrum.len()];

        for index in 0..segments {
            let chunk = &segment[index * step..index * step + nperseg];
            let offset = match params.detrend {
                Detrend::Constant => chunk.iter().sum::<f64>() / nperseg as f64,
                Detrend::None => 0.0,
            };
            for ((slot, &x), &w) in input.iter_mut().zip(chunk).zip(&window) {
                *slot = (x - offset) * w;
            }

            r2c.process(&mut input, &mut spectrum)
                .map_err(|e| EmgError::estimator(format!("FFT failed: {}", e)))?;

            for (acc, bin) in power.iter_mut().zip(&spectrum) {
                *acc += bin.norm_sqr();
            }
        }

        // Fold negative frequencies: every bin but DC (and Nyquist when even)
        let last_doubled = if nperseg % 2 == 0 { power.len() - 1 } else { power.len() };
        for (k, p) in power.iter_mut().enumerate() {
            *p *= scale / segments as f64;
            if k > 0 && k < last_doubled {
                *p *= 2.0;
            }
        }

        let resolution = fs.hz() / nperseg as f64;
        let frequencies = (0..power.len()).map(|k| k as f64 * resolution).collect();

        trace!(nperseg, noverlap = params.noverlap, segments, "Welch estimate");
        SpectralEstimate::new(frequencies, power)
    }
}

/// Window coefficients of length `n`; Hann is the periodic (DFT-even) form
pub fn taper_window(taper: Taper, n: usize) -> Vec<f64> {
    match taper {
        Taper::Rectangular => vec![1.0; n],
        Taper::Hann if n == 1 => vec![1.0],
        Taper::Hann => (0..n)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
            .collect(),
    }
}
