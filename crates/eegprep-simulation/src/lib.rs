//! EEGPrep-Simulation: Synthetic EEG generation
//!
//! Produces realistic-enough multi-channel recordings with known seizure
//! episodes for testing and smoke runs.

pub mod eeg_simulator;

pub use eeg_simulator::{BandOscillation, EegSimulator, SimulationConfig};
