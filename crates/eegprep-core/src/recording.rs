//! Recording access abstraction
//!
//! The windowing engine never loads a whole recording; it asks a
//! `RecordingReader` for one chunk's sample range at a time. File-format
//! concerns (EDF, npy, ...) live behind this trait.

use crate::error::{EegError, EegResult};

/// Read-only handle to one multi-channel recording.
pub trait RecordingReader {
    /// Identifier used to match seizure intervals (typically the file stem).
    fn id(&self) -> &str;

    /// Number of channels in the source.
    fn channel_count(&self) -> usize;

    /// Total samples per channel.
    fn sample_count(&self) -> usize;

    /// Native sampling rate in Hz.
    fn sample_rate(&self) -> f32;

    /// Read samples `[start, stop)` for every channel, channel-major.
    /// Each inner vector has length `stop - start`.
    fn read_range(&mut self, start: usize, stop: usize) -> EegResult<Vec<Vec<f32>>>;
}

/// Recording held entirely in memory. Used by the simulator and by tests;
/// real data goes through a file-backed reader.
#[derive(Debug, Clone)]
pub struct InMemoryRecording {
    id: String,
    sample_rate: f32,
    /// `channels[ch][sample]`
    channels: Vec<Vec<f32>>,
}

impl InMemoryRecording {
    pub fn new(id: impl Into<String>, sample_rate: f32, channels: Vec<Vec<f32>>) -> EegResult<Self> {
        if sample_rate <= 0.0 {
            return Err(EegError::InvalidSignalData {
                reason: "Sampling rate must be positive".to_string(),
            });
        }
        if let Some(first) = channels.first() {
            let n = first.len();
            if channels.iter().any(|c| c.len() != n) {
                return Err(EegError::InvalidSignalData {
                    reason: "All channels must have the same length".to_string(),
                });
            }
        }
        Ok(Self {
            id: id.into(),
            sample_rate,
            channels,
        })
    }
}

impl RecordingReader for InMemoryRecording {
    fn id(&self) -> &str {
        &self.id
    }

    fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn sample_count(&self) -> usize {
        self.channels.first().map_or(0, |c| c.len())
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn read_range(&mut self, start: usize, stop: usize) -> EegResult<Vec<Vec<f32>>> {
        if start > stop || stop > self.sample_count() {
            return Err(EegError::ShapeMismatch {
                reason: format!(
                    "range [{}, {}) out of bounds for {} samples",
                    start,
                    stop,
                    self.sample_count()
                ),
            });
        }
        Ok(self
            .channels
            .iter()
            .map(|c| c[start..stop].to_vec())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_recording() {
        let mut rec = InMemoryRecording::new(
            "test_01",
            256.0,
            vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0]],
        )
        .unwrap();

        assert_eq!(rec.channel_count(), 2);
        assert_eq!(rec.sample_count(), 4);

        let range = rec.read_range(1, 3).unwrap();
        assert_eq!(range[0], vec![2.0, 3.0]);
        assert_eq!(range[1], vec![6.0, 7.0]);
    }

    #[test]
    fn test_ragged_channels_rejected() {
        let result =
            InMemoryRecording::new("bad", 256.0, vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_bounds_range() {
        let mut rec =
            InMemoryRecording::new("test_01", 256.0, vec![vec![0.0; 10]]).unwrap();
        assert!(rec.read_range(5, 20).is_err());
        assert!(rec.read_range(7, 3).is_err());
    }
}
