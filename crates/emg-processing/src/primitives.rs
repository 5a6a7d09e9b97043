//! Feature primitives for EMG fatigue analysis
//!
//! Pure functions over `(frequency, power)` arrays and raw time-domain
//! segments. None of them fail: denominators that can legitimately be zero go
//! through [`regularized_div`], and empty inputs yield `0.0`.

use crate::spectral::BandDefinition;

/// Regularization added to denominators that may be zero
pub const EPSILON: f64 = 1e-12;

/// `numerator / (denominator + EPSILON)`
#[inline]
pub fn regularized_div(numerator: f64, denominator: f64) -> f64 {
    numerator / (denominator + EPSILON)
}

// Frequency domain

/// Power-weighted mean frequency, Σ(f·P)/ΣP
pub fn mean_frequency(f: &[f64], p: &[f64]) -> f64 {
    let weighted: f64 = f.iter().zip(p).map(|(f, p)| f * p).sum();
    regularized_div(weighted, p.iter().sum())
}

/// Frequency at which cumulative power reaches half of the total
///
/// Interpolates linearly between the two bins bracketing the half-power point.
/// A crossing at the first bin returns the first frequency, a crossing past
/// the last bin returns the last frequency, and a flat bracket returns the
/// upper bin's frequency.
pub fn median_frequency(f: &[f64], p: &[f64]) -> f64 {
    let n = f.len().min(p.len());
    if n == 0 {
        return 0.0;
    }

    let cumulative: Vec<f64> = p[..n]
        .iter()
        .scan(0.0, |acc, &x| {
            *acc += x;
            Some(*acc)
        })
        .collect();
    let half = cumulative[n - 1] / 2.0;

    // first index with cumulative >= half
    let idx = cumulative.partition_point(|&c| c < half);
    if idx == 0 {
        return f[0];
    }
    if idx >= n {
        return f[n - 1];
    }

    let (f0, f1) = (f[idx - 1], f[idx]);
    let (c0, c1) = (cumulative[idx - 1], cumulative[idx]);
    if c1 == c0 {
        return f1;
    }
    f0 + (half - c0) * (f1 - f0) / (c1 - c0)
}

/// Frequency of the strongest bin (first one on ties)
pub fn peak_frequency(f: &[f64], p: &[f64]) -> f64 {
    let mut best: Option<(usize, f64)> = None;
    for (i, &power) in p.iter().enumerate().take(f.len()) {
        match best {
            Some((_, max)) if power <= max => {}
            _ => best = Some((i, power)),
        }
    }
    best.map(|(i, _)| f[i]).unwrap_or(0.0)
}

/// k-th spectral moment, Σ(f^k·P)/ΣP
pub fn spectral_moment(f: &[f64], p: &[f64], k: i32) -> f64 {
    let weighted: f64 = f.iter().zip(p).map(|(f, p)| f.powi(k) * p).sum();
    regularized_div(weighted, p.iter().sum())
}

/// Ratio of two spectral moments
pub fn spectral_moment_ratio(f: &[f64], p: &[f64], k_num: i32, k_den: i32) -> f64 {
    regularized_div(spectral_moment(f, p, k_num), spectral_moment(f, p, k_den))
}

/// Second-to-first moment ratio (SMR 2/1)
pub fn smr_21(f: &[f64], p: &[f64]) -> f64 {
    spectral_moment_ratio(f, p, 2, 1)
}

/// Trapezoidal integral of power over the bins inside `band`
///
/// Returns 0.0 when no bin falls inside the band.
pub fn band_power(f: &[f64], p: &[f64], band: BandDefinition) -> f64 {
    let mut total = 0.0;
    let mut previous: Option<(f64, f64)> = None;
    for (&freq, &power) in f.iter().zip(p) {
        if !band.contains(freq) {
            continue;
        }
        if let Some((f0, p0)) = previous {
            total += 0.5 * (freq - f0) * (power + p0);
        }
        previous = Some((freq, power));
    }
    total
}

/// Band power of `numerator` relative to band power of `denominator`
pub fn power_ratio(
    f: &[f64],
    p: &[f64],
    numerator: BandDefinition,
    denominator: BandDefinition,
) -> f64 {
    regularized_div(band_power(f, p, numerator), band_power(f, p, denominator))
}

/// Normalized Shannon entropy of the in-band power distribution
///
/// Roughly 1 for a flat spectrum and 0 for a single tone. The normalizer is
/// `ln(n + EPSILON)`, which keeps the output compatible with existing feature
/// tables.
pub fn spectral_entropy(f: &[f64], p: &[f64], band: BandDefinition) -> f64 {
    let in_band: Vec<f64> = f
        .iter()
        .zip(p)
        .filter(|(freq, _)| band.contains(**freq))
        .map(|(_, power)| *power)
        .collect();
    if in_band.is_empty() {
        return 0.0;
    }

    let total: f64 = in_band.iter().sum();
    let entropy: f64 = -in_band
        .iter()
        .map(|power| {
            let prob = regularized_div(*power, total);
            prob * (prob + EPSILON).ln()
        })
        .sum::<f64>();

    entropy / (in_band.len() as f64 + EPSILON).ln()
}

// Time domain

/// Root mean square
pub fn rms(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    (x.iter().map(|v| v * v).sum::<f64>() / x.len() as f64).sqrt()
}

/// Mean absolute value
pub fn mav(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    x.iter().map(|v| v.abs()).sum::<f64>() / x.len() as f64
}

/// Cumulative absolute sample-to-sample change
pub fn waveform_length(x: &[f64]) -> f64 {
    x.windows(2).map(|w| (w[1] - w[0]).abs()).sum()
}

/// Population standard deviation
pub fn std_dev(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let n = x.len() as f64;
    let mean = x.iter().sum::<f64>() / n;
    (x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Number of sign changes of `x - threshold`
///
/// Samples exactly at the threshold are classed as negative.
pub fn zero_crossings(x: &[f64], threshold: f64) -> usize {
    let positive: Vec<bool> = x.iter().map(|v| v - threshold > 0.0).collect();
    positive.windows(2).filter(|w| w[0] != w[1]).count()
}
