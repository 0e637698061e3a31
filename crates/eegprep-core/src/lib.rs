//! EEGPrep-Core: Foundation types for the EEG dataset preparation pipeline
//!
//! Shared data model: seizure intervals, recording access, window batches,
//! and the error taxonomy used by every stage.

pub mod error;
pub mod intervals;
pub mod recording;
pub mod summary;
pub mod window;

pub use error::{EegError, EegResult};
pub use intervals::SeizureInterval;
pub use recording::{InMemoryRecording, RecordingReader};
pub use summary::parse_summary;
pub use window::WindowBatch;
