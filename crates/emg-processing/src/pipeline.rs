//! Sliding-window fatigue feature pipeline
//!
//! The DC-removed recording is cut into overlapping windows. Each window gets
//! its own spectral estimate and contributes exactly one [`FeatureVector`] to
//! the time-ordered [`FeatureTable`]. A trailing partial window is dropped.

use crate::config::{AnalysisConfig, WindowConfig};
use crate::primitives::{
    mav, mean_frequency, median_frequency, peak_frequency, power_ratio, rms, smr_21,
    spectral_entropy, std_dev, waveform_length, zero_crossings,
};
use crate::spectral::{PsdEstimator, SpectralEstimate, WelchEstimator};
use crate::summary::{summarize, WholeSignalSummary};
use emg_core::{
    infer_timing, EmgError, EmgResult, SamplingRate, TimeSeries, TimingStats, Uuid, MICROS_TO_SECS,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

/// Feature vector for one analysis window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Window centre time (s)
    pub t_center_s: f64,
    /// Mean frequency (Hz)
    pub mnf_hz: f64,
    /// Median frequency (Hz)
    pub mdf_hz: f64,
    /// Peak frequency (Hz)
    pub peak_hz: f64,
    /// Sum of in-band PSD values
    pub band_power: f64,
    /// Second-to-first spectral moment ratio
    pub smr_21: f64,
    #[serde(rename = "LHRatio")]
    pub lh_ratio: f64,
    #[serde(rename = "LMRatio")]
    pub lm_ratio: f64,
    #[serde(rename = "HTRatio")]
    pub ht_ratio: f64,
    /// Normalized spectral entropy
    pub spec_ent: f64,
    pub rms: f64,
    pub mav: f64,
    /// Waveform length
    pub wl: f64,
    /// Zero crossings
    #[serde(rename = "ZC")]
    pub zc: usize,
}

impl FeatureVector {
    /// Column names in output order
    pub const COLUMNS: [&'static str; 14] = [
        "t_center_s", "mnf_hz", "mdf_hz", "peak_hz", "band_power", "smr_21",
        "LHRatio", "LMRatio", "HTRatio", "spec_ent", "rms", "mav", "wl", "ZC",
    ];

    /// CSV header line
    pub fn csv_header() -> String {
        Self::COLUMNS.join(",")
    }

    /// CSV row in [`FeatureVector::COLUMNS`] order
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            self.t_center_s,
            self.mnf_hz,
            self.mdf_hz,
            self.peak_hz,
            self.band_power,
            self.smr_21,
            self.lh_ratio,
            self.lm_ratio,
            self.ht_ratio,
            self.spec_ent,
            self.rms,
            self.mav,
            self.wl,
            self.zc,
        )
    }
}

/// Time-ordered feature vectors, one per window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureTable {
    rows: Vec<FeatureVector>,
}

impl FeatureTable {
    pub fn with_capacity(capacity: usize) -> Self {
        FeatureTable { rows: Vec::with_capacity(capacity) }
    }

    fn push(&mut self, row: FeatureVector) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeatureVector> {
        self.rows.iter()
    }

    /// One feature across all windows, e.g. `table.column(|v| v.mdf_hz)`
    pub fn column(&self, feature: impl Fn(&FeatureVector) -> f64) -> Vec<f64> {
        self.rows.iter().map(feature).collect()
    }

    /// Whole table as CSV text with header
    pub fn to_csv(&self) -> String {
        let mut csv = FeatureVector::csv_header();
        csv.push('\n');
        for row in &self.rows {
            csv.push_str(&row.to_csv_row());
            csv.push('\n');
        }
        csv
    }
}

impl From<Vec<FeatureVector>> for FeatureTable {
    fn from(rows: Vec<FeatureVector>) -> Self {
        FeatureTable { rows }
    }
}

impl<'a> IntoIterator for &'a FeatureTable {
    type Item = &'a FeatureVector;
    type IntoIter = std::slice::Iter<'a, FeatureVector>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Window length, hop and count for a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowLayout {
    /// Samples per window
    pub window_len: usize,
    /// Samples between consecutive window starts
    pub hop: usize,
    /// Number of complete windows
    pub count: usize,
}

impl WindowLayout {
    /// Lay out windows over `signal_len` samples
    ///
    /// Lengths are rounded half-to-even; the hop is at least one sample.
    pub fn new(signal_len: usize, fs: SamplingRate, window: &WindowConfig) -> EmgResult<Self> {
        let window_len = (window.duration_s * fs.hz()).round_ties_even() as usize;
        if window_len == 0 {
            return Err(EmgError::config(format!(
                "{} s window is shorter than one sample at {}",
                window.duration_s, fs
            )));
        }
        let hop = ((window_len as f64 * (1.0 - window.overlap)).round_ties_even() as usize).max(1);

        Ok(WindowLayout {
            window_len,
            hop,
            count: Self::window_count(signal_len, window_len, hop),
        })
    }

    /// ⌊(n − window_len)/hop⌋ + 1 complete windows, or 0 if n < window_len
    pub fn window_count(signal_len: usize, window_len: usize, hop: usize) -> usize {
        if signal_len < window_len || hop == 0 {
            return 0;
        }
        (signal_len - window_len) / hop + 1
    }

    /// Start index of each complete window
    pub fn starts(&self) -> impl Iterator<Item = usize> {
        let hop = self.hop;
        (0..self.count).map(move |i| i * hop)
    }
}

/// Compute the feature vector of one window from its spectral estimate
pub fn window_features(
    psd: &SpectralEstimate,
    segment: &[f64],
    t_center_s: f64,
    config: &AnalysisConfig,
) -> FeatureVector {
    let band = psd.restrict(config.analysis_band);
    let band_power: f64 = band.power.iter().sum();
    let smr = smr_21(&band.frequencies, &band.power);

    let degenerate = band_power <= 0.0
        || band.power.iter().all(|p| p.abs() <= config.degenerate_power_atol);
    let (mnf_hz, mdf_hz, peak_hz) = if degenerate {
        trace!(t_center_s, band_power, "Degenerate window spectrum");
        (0.0, 0.0, 0.0)
    } else {
        (
            mean_frequency(&band.frequencies, &band.power),
            median_frequency(&band.frequencies, &band.power),
            peak_frequency(&band.frequencies, &band.power),
        )
    };

    let (f, p) = (&psd.frequencies, &psd.power);
    let bands = &config.sub_bands;

    FeatureVector {
        t_center_s,
        mnf_hz,
        mdf_hz,
        peak_hz,
        band_power,
        smr_21: smr,
        lh_ratio: power_ratio(f, p, bands.low, bands.high),
        lm_ratio: power_ratio(f, p, bands.low, bands.mid),
        ht_ratio: power_ratio(f, p, bands.high, bands.full),
        spec_ent: spectral_entropy(f, p, config.analysis_band),
        rms: rms(segment),
        mav: mav(segment),
        wl: waveform_length(segment),
        zc: zero_crossings(segment, config.zc_threshold_ratio * std_dev(segment)),
    }
}

/// Estimate and featurize the window starting at `start`
fn process_window<E: PsdEstimator>(
    estimator: &mut E,
    signal: &[f64],
    timestamps_us: &[f64],
    start: usize,
    layout: &WindowLayout,
    fs: SamplingRate,
    config: &AnalysisConfig,
) -> EmgResult<FeatureVector> {
    let segment = &signal[start..start + layout.window_len];
    let params = config.segments.window_params(fs, segment.len());
    let psd = estimator.estimate(segment, fs, &params)?;

    let t_center_s = timestamps_us[start] * MICROS_TO_SECS + 0.5 * layout.window_len as f64 / fs.hz();
    Ok(window_features(&psd, segment, t_center_s, config))
}

fn check_alignment(signal: &[f64], timestamps_us: &[f64]) -> EmgResult<()> {
    if signal.len() != timestamps_us.len() {
        return Err(EmgError::MismatchedColumns {
            timestamps: timestamps_us.len(),
            samples: signal.len(),
        });
    }
    Ok(())
}

/// Sliding-window features over a DC-removed signal
pub fn windowed_features<E: PsdEstimator>(
    estimator: &mut E,
    signal: &[f64],
    timestamps_us: &[f64],
    fs: SamplingRate,
    config: &AnalysisConfig,
) -> EmgResult<FeatureTable> {
    check_alignment(signal, timestamps_us)?;
    let layout = WindowLayout::new(signal.len(), fs, &config.window)?;
    debug!(
        window_len = layout.window_len,
        hop = layout.hop,
        windows = layout.count,
        "Window layout"
    );

    let mut table = FeatureTable::with_capacity(layout.count);
    for start in layout.starts() {
        table.push(process_window(estimator, signal, timestamps_us, start, &layout, fs, config)?);
    }
    Ok(table)
}

/// Sliding-window features computed in parallel, one estimator per worker
///
/// Rows come back in window order, identical to [`windowed_features`].
#[cfg(feature = "parallel")]
pub fn windowed_features_parallel<E, F>(
    make_estimator: F,
    signal: &[f64],
    timestamps_us: &[f64],
    fs: SamplingRate,
    config: &AnalysisConfig,
) -> EmgResult<FeatureTable>
where
    E: PsdEstimator,
    F: Fn() -> E + Sync + Send,
{
    use rayon::prelude::*;

    check_alignment(signal, timestamps_us)?;
    let layout = WindowLayout::new(signal.len(), fs, &config.window)?;
    debug!(
        window_len = layout.window_len,
        hop = layout.hop,
        windows = layout.count,
        "Window layout (parallel)"
    );

    let rows = (0..layout.count)
        .into_par_iter()
        .map_init(&make_estimator, |estimator, index| {
            process_window(estimator, signal, timestamps_us, index * layout.hop, &layout, fs, config)
        })
        .collect::<EmgResult<Vec<_>>>()?;
    Ok(FeatureTable::from(rows))
}

/// Everything one analysis run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Identifier of the analysed recording
    pub recording_id: Uuid,
    /// Sampling-rate inference diagnostics
    pub timing: TimingStats,
    /// Window layout used for the feature table
    pub layout: WindowLayout,
    /// Whole-recording spectral summary
    pub summary: WholeSignalSummary,
    /// Per-window features
    pub features: FeatureTable,
}

impl AnalysisReport {
    pub fn sampling_rate(&self) -> SamplingRate {
        self.timing.sampling_rate
    }
}

/// Fatigue analysis pipeline: inference, summary and windowed features
pub struct FatiguePipeline<E: PsdEstimator = WelchEstimator> {
    config: AnalysisConfig,
    estimator: E,
}

impl FatiguePipeline<WelchEstimator> {
    /// Pipeline with the bundled Welch estimator
    pub fn new(config: AnalysisConfig) -> EmgResult<Self> {
        Self::with_estimator(config, WelchEstimator::new())
    }
}

impl<E: PsdEstimator> FatiguePipeline<E> {
    /// Pipeline with a caller-supplied estimator
    pub fn with_estimator(config: AnalysisConfig, estimator: E) -> EmgResult<Self> {
        config.validate()?;
        Ok(FatiguePipeline { config, estimator })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Whole-recording summary of a DC-removed signal
    pub fn whole_signal_summary(
        &mut self,
        signal: &[f64],
        fs: SamplingRate,
    ) -> EmgResult<WholeSignalSummary> {
        summarize(&mut self.estimator, signal, fs, &self.config)
    }

    /// Sliding-window features of a DC-removed signal
    pub fn windowed_features(
        &mut self,
        signal: &[f64],
        timestamps_us: &[f64],
        fs: SamplingRate,
    ) -> EmgResult<FeatureTable> {
        windowed_features(&mut self.estimator, signal, timestamps_us, fs, &self.config)
    }

    /// Run the full analysis on a recording
    ///
    /// Fails before any spectral work if the sampling rate cannot be inferred.
    pub fn run(&mut self, series: &TimeSeries) -> EmgResult<AnalysisReport> {
        let timing = infer_timing(series.timestamps_us(), self.config.min_valid_deltas)?;
        let fs = timing.sampling_rate;
        let signal = series.dc_removed();

        let summary = self.whole_signal_summary(&signal, fs)?;
        let layout = WindowLayout::new(signal.len(), fs, &self.config.window)?;
        let features = self.windowed_features(&signal, series.timestamps_us(), fs)?;

        info!(
            recording = %series.id(),
            fs_hz = fs.hz(),
            mnf_hz = summary.mnf_hz,
            mdf_hz = summary.mdf_hz,
            windows = features.len(),
            "Analysis complete"
        );

        Ok(AnalysisReport {
            recording_id: series.id(),
            timing,
            layout,
            summary,
            features,
        })
    }
}
