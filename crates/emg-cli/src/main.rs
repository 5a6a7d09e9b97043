//! EMG fatigue analysis command line tool

mod io;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use emg_processing::{AnalysisConfig, FatiguePipeline};
use emg_simulation::{EmgSimulator, SimulationConfig, Tone};
use io::CsvColumns;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "emg-fatigue", version, about = "Spectral fatigue analysis of surface EMG recordings")]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a recording and write the PSD and feature tables
    Analyze(AnalyzeArgs),
    /// Write a synthetic recording in the input CSV layout
    Simulate(SimulateArgs),
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Recording CSV
    input: PathBuf,
    /// Timestamp column (microseconds)
    #[arg(long, default_value = io::DEFAULT_TIME_COLUMN)]
    time_col: String,
    /// Filtered amplitude column
    #[arg(long, default_value = io::DEFAULT_SIGNAL_COLUMN)]
    signal_col: String,
    /// Analysis configuration JSON
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output directory (defaults to the input's directory)
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Window duration override (s)
    #[arg(long)]
    window_s: Option<f64>,
    /// Window overlap override, in [0, 1)
    #[arg(long)]
    overlap: Option<f64>,
    /// Also write a JSON run report
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SimulateArgs {
    /// Output CSV
    output: PathBuf,
    /// Sampling rate (Hz)
    #[arg(long, default_value_t = 2000.0)]
    fs: f64,
    /// Duration (s)
    #[arg(long, default_value_t = 30.0)]
    duration: f64,
    /// Tone frequency in Hz, repeatable
    #[arg(long = "tone")]
    tones: Vec<f64>,
    /// Gaussian noise standard deviation
    #[arg(long, default_value_t = 0.05)]
    noise: f64,
    /// Frequency drift (Hz/s)
    #[arg(long, default_value_t = -0.5, allow_hyphen_values = true)]
    drift: f64,
    /// Random seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::Analyze(args) => analyze(args),
        Commands::Simulate(args) => simulate(args),
    }
}

fn load_config(args: &AnalyzeArgs) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            AnalysisConfig::from_json(&json)
                .with_context(|| format!("Invalid configuration in {}", path.display()))?
        }
        None => AnalysisConfig::surface_emg(),
    };

    if let Some(duration) = args.window_s {
        config.window.duration_s = duration;
    }
    if let Some(overlap) = args.overlap {
        config.window.overlap = overlap;
    }
    config.validate().context("Invalid window override")?;
    Ok(config)
}

fn analyze(args: AnalyzeArgs) -> Result<()> {
    let config = load_config(&args)?;
    let columns = CsvColumns {
        time: args.time_col.clone(),
        signal: args.signal_col.clone(),
    };

    let series = io::read_recording(&args.input, &columns)?;
    let report = FatiguePipeline::new(config.clone())?
        .run(&series)
        .with_context(|| format!("Analysis of {} failed", args.input.display()))?;

    let out_dir = match &args.out_dir {
        Some(dir) => dir.clone(),
        None => args
            .input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    let paths = io::write_outputs(&args.input, &out_dir, &report, &config, args.json)?;

    let summary = &report.summary;
    println!("Recording:        {}", args.input.display());
    println!("Sampling rate:    {}", report.sampling_rate());
    println!("Mean frequency:   {:.2} Hz", summary.mnf_hz);
    println!("Median frequency: {:.2} Hz", summary.mdf_hz);
    println!("Peak frequency:   {:.2} Hz", summary.peak_hz);
    println!("Band power:       {:.6e}", summary.band_power);
    println!("Windows:          {}", report.features.len());
    println!("PSD table:        {}", paths.psd.display());
    println!("Feature table:    {}", paths.features.display());
    if let Some(path) = &paths.summary {
        println!("Run report:       {}", path.display());
    }
    Ok(())
}

fn simulate(args: SimulateArgs) -> Result<()> {
    let mut config = SimulationConfig::fatiguing_contraction(args.fs, args.duration);
    if !args.tones.is_empty() {
        config.tones = args
            .tones
            .iter()
            .map(|&frequency_hz| Tone { frequency_hz, amplitude: 1.0 })
            .collect();
    }
    config.noise.gaussian_std = args.noise;
    config.frequency_drift_hz_per_s = args.drift;
    config.seed = args.seed;

    let series = EmgSimulator::new(config)?.generate()?;
    io::write_recording(&args.output, &series, &CsvColumns::default())?;

    info!(path = %args.output.display(), samples = series.len(), "Wrote synthetic recording");
    println!("Wrote {} samples to {}", series.len(), args.output.display());
    Ok(())
}
