//! EEGPrep-Pipeline: Windowing, labeling, and feature extraction
//!
//! Turns long multi-channel EEG recordings into a labeled, fixed-shape
//! feature dataset: chunked windowing with seizure labeling and chunk-local
//! normalization, then per-window time-domain and band-power features.

pub mod config;
pub mod dataset;
pub mod features;
pub mod npy;
pub mod reader;
pub mod resample;
pub mod welch;
pub mod windowing;

pub use config::{FrequencyBand, PipelineConfig};
pub use dataset::DatasetAssembler;
pub use features::FeatureExtractor;
pub use npy::NpyArray;
pub use reader::NpyRecording;
pub use windowing::WindowingEngine;
