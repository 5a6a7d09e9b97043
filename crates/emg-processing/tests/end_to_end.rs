//! Full analysis runs over synthetic recordings

use emg_processing::{AnalysisConfig, FatiguePipeline};
use emg_simulation::{simulate, SimulationConfig};

#[test]
fn test_pure_tone_recording() {
    let series = simulate(SimulationConfig::pure_tone(100.0, 2000.0, 2.0)).unwrap();
    let report = FatiguePipeline::new(AnalysisConfig::surface_emg())
        .unwrap()
        .run(&series)
        .unwrap();

    assert_eq!(report.sampling_rate().hz(), 2000.0);
    assert_eq!(report.layout.window_len, 500);
    assert_eq!(report.features.len(), 29);

    let summary = &report.summary;
    assert!((summary.mnf_hz - 100.0).abs() < 2.0);
    assert!((summary.mdf_hz - 100.0).abs() < 2.0);
    assert!((summary.peak_hz - 100.0).abs() < 2.0);

    for row in report.features.iter() {
        assert!((row.peak_hz - 100.0).abs() < 2.0, "peak {}", row.peak_hz);
        assert!(row.lm_ratio < 1e-3);
    }
}

#[test]
fn test_imperfect_timestamps_still_infer_rate() {
    let mut config = SimulationConfig::pure_tone(100.0, 2000.0, 2.0);
    config.timing.duplicate_prob = 0.05;
    let series = simulate(config).unwrap();

    let report = FatiguePipeline::new(AnalysisConfig::surface_emg())
        .unwrap()
        .run(&series)
        .unwrap();
    assert_eq!(report.sampling_rate().hz(), 2000.0);
    assert!(report.timing.discarded_deltas > 0);
}

#[test]
fn test_frequency_drift_lowers_mean_frequency() {
    let series = simulate(SimulationConfig::fatiguing_contraction(2000.0, 20.0)).unwrap();
    let report = FatiguePipeline::new(AnalysisConfig::surface_emg())
        .unwrap()
        .run(&series)
        .unwrap();

    let mnf = report.features.column(|row| row.mnf_hz);
    let mdf = report.features.column(|row| row.mdf_hz);
    let head = |v: &[f64]| v[..5].iter().sum::<f64>() / 5.0;
    let tail = |v: &[f64]| v[v.len() - 5..].iter().sum::<f64>() / 5.0;

    assert!(head(&mnf) - tail(&mnf) > 20.0, "mnf {} -> {}", head(&mnf), tail(&mnf));
    assert!(head(&mdf) > tail(&mdf));

    let times = report.features.column(|row| row.t_center_s);
    assert!(times.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn test_silent_recording_yields_degenerate_windows() {
    let mut config = SimulationConfig::pure_tone(100.0, 2000.0, 1.0);
    config.tones.clear();
    config.noise.dc_offset = 0.7;
    let series = simulate(config).unwrap();

    let report = FatiguePipeline::new(AnalysisConfig::surface_emg())
        .unwrap()
        .run(&series)
        .unwrap();

    assert!(!report.features.is_empty());
    for row in report.features.iter() {
        assert_eq!(row.mnf_hz, 0.0);
        assert_eq!(row.mdf_hz, 0.0);
        assert_eq!(row.peak_hz, 0.0);
        assert_eq!(row.zc, 0);
        assert_eq!(row.wl, 0.0);
    }
}
