//! Whole-recording spectral summary
//!
//! One Welch estimate over the entire DC-removed recording, reduced to four
//! scalars. Diagnostic only: the windowed features do not depend on it.

use crate::config::AnalysisConfig;
use crate::primitives::{mean_frequency, median_frequency, peak_frequency};
use crate::spectral::{PsdEstimator, SpectralEstimate, WelchParams};
use emg_core::{EmgResult, SamplingRate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Spectral descriptors of the whole recording inside the analysis band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WholeSignalSummary {
    /// Mean frequency (Hz)
    pub mnf_hz: f64,
    /// Median frequency (Hz)
    pub mdf_hz: f64,
    /// Frequency of the strongest in-band bin (Hz)
    pub peak_hz: f64,
    /// Direct sum of in-band PSD values
    pub band_power: f64,
    /// Welch parameters actually used
    pub params: WelchParams,
    /// Full, unrestricted estimate for PSD table output
    #[serde(skip)]
    pub psd: SpectralEstimate,
}

/// Estimate the PSD of the whole recording and summarize the analysis band
pub fn summarize<E: PsdEstimator>(
    estimator: &mut E,
    signal: &[f64],
    fs: SamplingRate,
    config: &AnalysisConfig,
) -> EmgResult<WholeSignalSummary> {
    let params = config.segments.whole_signal_params(fs, signal.len());
    debug!(
        nperseg = params.nperseg,
        noverlap = params.noverlap,
        samples = signal.len(),
        "Whole-signal Welch parameters"
    );

    let psd = estimator.estimate(signal, fs, &params)?;
    let band = psd.restrict(config.analysis_band);

    if band.is_empty() {
        warn!(
            low = config.analysis_band.low(),
            high = config.analysis_band.high(),
            "No PSD bins inside the analysis band"
        );
    }

    Ok(WholeSignalSummary {
        mnf_hz: mean_frequency(&band.frequencies, &band.power),
        mdf_hz: median_frequency(&band.frequencies, &band.power),
        peak_hz: peak_frequency(&band.frequencies, &band.power),
        band_power: band.power.iter().sum(),
        params,
        psd,
    })
}
