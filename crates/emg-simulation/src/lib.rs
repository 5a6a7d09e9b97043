//! EMG-Simulation: synthetic surface EMG recordings
//!
//! Deterministic (seeded) recordings with known spectral content, used to
//! exercise the fatigue analysis without real acquisitions.

pub mod emg_simulator;
pub mod signal_patterns;

pub use emg_simulator::*;
pub use signal_patterns::*;
