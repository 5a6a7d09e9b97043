//! Amplitude envelopes for simulated muscle contractions

use serde::{Deserialize, Serialize};

/// Activation envelope applied to the synthetic EMG carrier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SignalPattern {
    /// Constant activation level
    Constant { level: f64 },
    /// Linear change between two levels, held at the end level afterwards
    Ramp {
        start_level: f64,
        end_level: f64,
        duration: f64,
    },
    /// On/off contraction cycles
    Burst {
        on_duration: f64,
        off_duration: f64,
        amplitude: f64,
    },
    /// Exponentially decaying amplitude of a tiring muscle
    Fatigue {
        initial_amplitude: f64,
        decay_rate: f64,
    },
}

impl SignalPattern {
    /// Activation level at time `time` (s)
    pub fn activation_at_time(&self, time: f64) -> f64 {
        match *self {
            SignalPattern::Constant { level } => level,

            SignalPattern::Ramp { start_level, end_level, duration } => {
                if duration <= 0.0 || time >= duration {
                    end_level
                } else {
                    start_level + (end_level - start_level) * (time / duration)
                }
            }

            SignalPattern::Burst { on_duration, off_duration, amplitude } => {
                let cycle = on_duration + off_duration;
                if cycle <= 0.0 {
                    return amplitude;
                }
                if time.rem_euclid(cycle) < on_duration {
                    amplitude
                } else {
                    0.0
                }
            }

            SignalPattern::Fatigue { initial_amplitude, decay_rate } => {
                initial_amplitude * (-decay_rate * time).exp()
            }
        }
    }

    /// Get pattern description
    pub fn description(&self) -> &'static str {
        match self {
            SignalPattern::Constant { .. } => "Constant activation",
            SignalPattern::Ramp { .. } => "Gradual ramp",
            SignalPattern::Burst { .. } => "Burst pattern",
            SignalPattern::Fatigue { .. } => "Muscle fatigue",
        }
    }

    /// Common preset envelopes
    pub fn presets() -> Vec<(&'static str, SignalPattern)> {
        vec![
            ("Sustained", SignalPattern::Constant { level: 1.0 }),
            ("Warmup", SignalPattern::Ramp { start_level: 0.1, end_level: 1.0, duration: 5.0 }),
            ("Repetitions", SignalPattern::Burst { on_duration: 2.0, off_duration: 1.0, amplitude: 1.0 }),
            ("Fatigue Test", SignalPattern::Fatigue { initial_amplitude: 1.0, decay_rate: 0.05 }),
        ]
    }
}

impl Default for SignalPattern {
    fn default() -> Self {
        SignalPattern::Constant { level: 1.0 }
    }
}
