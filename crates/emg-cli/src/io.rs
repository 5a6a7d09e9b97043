//! Recording input and analysis output files
//!
//! Input is a headered CSV with a microsecond timestamp column and a filtered
//! amplitude column. Output is the whole-recording PSD table, the per-window
//! feature table and an optional JSON run report.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use emg_core::{TimeSeries, TimingStats, Uuid};
use emg_processing::{AnalysisConfig, AnalysisReport, SpectralEstimate, WholeSignalSummary};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_TIME_COLUMN: &str = "Time(us)";
pub const DEFAULT_SIGNAL_COLUMN: &str = "Filtered";

/// Names of the columns to read from a recording CSV
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvColumns {
    pub time: String,
    pub signal: String,
}

impl Default for CsvColumns {
    fn default() -> Self {
        Self {
            time: DEFAULT_TIME_COLUMN.to_string(),
            signal: DEFAULT_SIGNAL_COLUMN.to_string(),
        }
    }
}

/// Split a row on commas and strip surrounding quotes
///
/// Quoted cells containing commas are not supported and are rejected.
fn split_row(line: &str) -> Result<Vec<&str>> {
    line.split(',')
        .map(|cell| {
            let cell = cell.trim();
            let opens = cell.starts_with('"');
            let closes = cell.len() > 1 && cell.ends_with('"');
            if opens != closes {
                bail!("quoted cells containing commas are not supported");
            }
            Ok(cell.trim_matches('"'))
        })
        .collect()
}

/// Parse recording CSV text
pub fn parse_recording(text: &str, columns: &CsvColumns) -> Result<TimeSeries> {
    let mut lines = text.lines().enumerate();

    let (_, header) = lines.next().ok_or_else(|| anyhow!("CSV is empty"))?;
    let header = split_row(header.trim_start_matches('\u{feff}')).context("line 1")?;
    let find = |name: &str| {
        header
            .iter()
            .position(|h| *h == name)
            .ok_or_else(|| anyhow!("Column '{}' not found in header {:?}", name, header))
    };
    let time_idx = find(&columns.time)?;
    let signal_idx = find(&columns.signal)?;

    let mut timestamps = Vec::new();
    let mut samples = Vec::new();

    for (index, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = index + 1;
        let cells = split_row(line).with_context(|| format!("line {}", line_no))?;
        let cell = |idx: usize, name: &str| -> Result<f64> {
            let raw = cells
                .get(idx)
                .ok_or_else(|| anyhow!("line {}: missing '{}' value", line_no, name))?;
            raw.parse::<f64>()
                .with_context(|| format!("line {}: invalid '{}' value '{}'", line_no, name, raw))
        };
        timestamps.push(cell(time_idx, &columns.time)?);
        samples.push(cell(signal_idx, &columns.signal)?);
    }

    Ok(TimeSeries::new(timestamps, samples)?)
}

/// Read a recording CSV from disk
pub fn read_recording(path: &Path, columns: &CsvColumns) -> Result<TimeSeries> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let series = parse_recording(&text, columns)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    debug!(path = %path.display(), samples = series.len(), "Loaded recording");
    Ok(series)
}

/// Recording in the input CSV layout
pub fn recording_csv(series: &TimeSeries, columns: &CsvColumns) -> String {
    let mut out = format!("{},{}\n", columns.time, columns.signal);
    for (t, x) in series.timestamps_us().iter().zip(series.samples()) {
        out.push_str(&format!("{},{}\n", t, x));
    }
    out
}

/// Write a recording CSV to disk
pub fn write_recording(path: &Path, series: &TimeSeries, columns: &CsvColumns) -> Result<()> {
    fs::write(path, recording_csv(series, columns))
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Whole-recording PSD table, ascending frequency
pub fn psd_csv(psd: &SpectralEstimate) -> String {
    let mut out = String::from("frequency_hz,psd\n");
    for (f, p) in psd.frequencies.iter().zip(&psd.power) {
        out.push_str(&format!("{},{}\n", f, p));
    }
    out
}

/// JSON report of one analysis run
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub run_id: Uuid,
    pub recording_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub sampling_rate_hz: f64,
    pub timing: TimingStats,
    pub summary: &'a WholeSignalSummary,
    pub window_count: usize,
    pub config: &'a AnalysisConfig,
}

impl<'a> RunReport<'a> {
    pub fn new(source: &Path, report: &'a AnalysisReport, config: &'a AnalysisConfig) -> Self {
        RunReport {
            run_id: Uuid::new_v4(),
            recording_id: report.recording_id,
            generated_at: Utc::now(),
            source: source.display().to_string(),
            sampling_rate_hz: report.sampling_rate().hz(),
            timing: report.timing,
            summary: &report.summary,
            window_count: report.features.len(),
            config,
        }
    }
}

/// Paths of the files written for one run
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub psd: PathBuf,
    pub features: PathBuf,
    pub summary: Option<PathBuf>,
}

impl OutputPaths {
    pub fn for_stem(out_dir: &Path, stem: &str, with_summary: bool) -> Self {
        OutputPaths {
            psd: out_dir.join(format!("{}_welch_psd.csv", stem)),
            features: out_dir.join(format!("{}_freq_features.csv", stem)),
            summary: with_summary.then(|| out_dir.join(format!("{}_summary.json", stem))),
        }
    }
}

/// Write the PSD table, the feature table and optionally the JSON report
pub fn write_outputs(
    source: &Path,
    out_dir: &Path,
    report: &AnalysisReport,
    config: &AnalysisConfig,
    with_summary: bool,
) -> Result<OutputPaths> {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("Cannot derive output name from {}", source.display()))?;

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let paths = OutputPaths::for_stem(out_dir, stem, with_summary);

    fs::write(&paths.psd, psd_csv(&report.summary.psd))
        .with_context(|| format!("Failed to write {}", paths.psd.display()))?;
    fs::write(&paths.features, report.features.to_csv())
        .with_context(|| format!("Failed to write {}", paths.features.display()))?;

    if let Some(path) = &paths.summary {
        let json = serde_json::to_string_pretty(&RunReport::new(source, report, config))
            .context("Failed to serialize run report")?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    }

    info!(
        psd = %paths.psd.display(),
        features = %paths.features.display(),
        "Wrote analysis outputs"
    );
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use emg_processing::FatiguePipeline;
    use emg_simulation::{simulate, SimulationConfig};

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("emg-fatigue-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_parse_default_columns() {
        let text = "Index,Time(us),Raw,Filtered\n0,0,5,0.1\n1,500,6,-0.2\n\n2,1000,7,0.3\n";
        let series = parse_recording(text, &CsvColumns::default()).unwrap();
        assert_eq!(series.timestamps_us(), &[0.0, 500.0, 1000.0]);
        assert_eq!(series.samples(), &[0.1, -0.2, 0.3]);
    }

    #[test]
    fn test_parse_custom_columns() {
        let columns = CsvColumns {
            time: "t".to_string(),
            signal: "emg".to_string(),
        };
        let series = parse_recording("\"emg\",\"t\"\n1.5,10\n2.5,20\n", &columns).unwrap();
        assert_eq!(series.timestamps_us(), &[10.0, 20.0]);
        assert_eq!(series.samples(), &[1.5, 2.5]);
    }

    #[test]
    fn test_parse_quoted_comma_cell_is_rejected() {
        let text = "Time(us),Filtered\n0,\"1,5\"\n";
        let err = parse_recording(text, &CsvColumns::default()).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("line 2"), "{}", message);
        assert!(message.contains("quoted cells"), "{}", message);
    }

    #[test]
    fn test_parse_missing_column() {
        let err = parse_recording("Time(us),Raw\n0,1\n", &CsvColumns::default()).unwrap_err();
        assert!(err.to_string().contains("Filtered"));
    }

    #[test]
    fn test_parse_error_names_line() {
        let text = "Time(us),Filtered\n0,0.1\n500,abc\n";
        let err = parse_recording(text, &CsvColumns::default()).unwrap_err();
        assert!(err.to_string().contains("line 3"), "{}", err);
    }

    #[test]
    fn test_recording_csv_roundtrip() {
        let series = simulate(SimulationConfig::pure_tone(50.0, 1000.0, 0.05)).unwrap();
        let columns = CsvColumns::default();
        let parsed = parse_recording(&recording_csv(&series, &columns), &columns).unwrap();
        assert_eq!(parsed.timestamps_us(), series.timestamps_us());
        assert_eq!(parsed.samples(), series.samples());
    }

    #[test]
    fn test_psd_csv_layout() {
        let psd = SpectralEstimate::new(vec![0.0, 1.0], vec![0.5, 0.25]).unwrap();
        assert_eq!(psd_csv(&psd), "frequency_hz,psd\n0,0.5\n1,0.25\n");
    }

    #[test]
    fn test_write_outputs() {
        let dir = scratch_dir();
        let source = dir.join("trial_01.csv");
        let series = simulate(SimulationConfig::pure_tone(100.0, 2000.0, 2.0)).unwrap();
        write_recording(&source, &series, &CsvColumns::default()).unwrap();

        let loaded = read_recording(&source, &CsvColumns::default()).unwrap();
        let config = AnalysisConfig::surface_emg();
        let report = FatiguePipeline::new(config.clone()).unwrap().run(&loaded).unwrap();

        let paths = write_outputs(&source, &dir, &report, &config, true).unwrap();
        assert!(paths.psd.ends_with("trial_01_welch_psd.csv"));
        assert!(paths.features.ends_with("trial_01_freq_features.csv"));

        let features = fs::read_to_string(&paths.features).unwrap();
        assert_eq!(features.lines().count(), report.features.len() + 1);
        assert!(features.starts_with("t_center_s,"));

        let psd = fs::read_to_string(&paths.psd).unwrap();
        assert_eq!(psd.lines().count(), 513 + 1);

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(paths.summary.unwrap()).unwrap()).unwrap();
        assert_eq!(summary["sampling_rate_hz"], 2000.0);
        assert_eq!(summary["window_count"], report.features.len());

        fs::remove_dir_all(dir).ok();
    }
}
