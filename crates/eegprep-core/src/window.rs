//! WindowBatch: one chunk's worth of labeled, normalized windows

use crate::error::{EegError, EegResult};
use uuid::Uuid;

/// Output of the windowing engine for one chunk: a stack of fixed-shape
/// windows with their parallel binary labels.
///
/// Data is laid out window-major: all of window 0 (channel-major inside),
/// then all of window 1, and so on. Window indices `window_start` /
/// `window_stop` are absolute, half-open, in units of whole windows from
/// the start of the recording.
#[derive(Debug, Clone)]
pub struct WindowBatch {
    /// Unique identifier for this batch
    pub id: Uuid,
    /// Recording the batch was cut from
    pub recording_id: String,
    /// Absolute index of the first window in this batch
    pub window_start: usize,
    /// Absolute index one past the last window in this batch
    pub window_stop: usize,
    /// Channels per window
    pub channels: usize,
    /// Samples per channel per window
    pub samples_per_window: usize,
    /// Flat window data `[n_windows * channels * samples_per_window]`
    pub data: Vec<f32>,
    /// One 0/1 label per window
    pub labels: Vec<i8>,
}

impl WindowBatch {
    pub fn new(
        recording_id: impl Into<String>,
        window_start: usize,
        window_stop: usize,
        channels: usize,
        samples_per_window: usize,
        data: Vec<f32>,
        labels: Vec<i8>,
    ) -> EegResult<Self> {
        let n_windows = window_stop
            .checked_sub(window_start)
            .ok_or_else(|| EegError::ShapeMismatch {
                reason: format!(
                    "window range [{}, {}) is inverted",
                    window_start, window_stop
                ),
            })?;

        let expected = n_windows * channels * samples_per_window;
        if data.len() != expected {
            return Err(EegError::ShapeMismatch {
                reason: format!(
                    "data length {} doesn't match {} windows x {} channels x {} samples",
                    data.len(),
                    n_windows,
                    channels,
                    samples_per_window
                ),
            });
        }
        if labels.len() != n_windows {
            return Err(EegError::ShapeMismatch {
                reason: format!(
                    "label count {} doesn't match window count {}",
                    labels.len(),
                    n_windows
                ),
            });
        }
        if labels.iter().any(|&l| l != 0 && l != 1) {
            return Err(EegError::InvalidSignalData {
                reason: "labels must be 0 or 1".to_string(),
            });
        }

        Ok(WindowBatch {
            id: Uuid::new_v4(),
            recording_id: recording_id.into(),
            window_start,
            window_stop,
            channels,
            samples_per_window,
            data,
            labels,
        })
    }

    /// Number of windows in this batch.
    pub fn window_count(&self) -> usize {
        self.window_stop - self.window_start
    }

    pub fn is_empty(&self) -> bool {
        self.window_count() == 0
    }

    /// Values per window when flattened to one row.
    pub fn window_len(&self) -> usize {
        self.channels * self.samples_per_window
    }

    /// One window as a flat channel-major slice.
    pub fn window(&self, index: usize) -> EegResult<&[f32]> {
        if index >= self.window_count() {
            return Err(EegError::ShapeMismatch {
                reason: format!(
                    "window index {} out of bounds for {} windows",
                    index,
                    self.window_count()
                ),
            });
        }
        let len = self.window_len();
        Ok(&self.data[index * len..(index + 1) * len])
    }

    /// One channel of one window.
    pub fn window_channel(&self, index: usize, channel: usize) -> EegResult<&[f32]> {
        if channel >= self.channels {
            return Err(EegError::ShapeMismatch {
                reason: format!(
                    "channel index {} out of bounds for {} channels",
                    channel, self.channels
                ),
            });
        }
        let window = self.window(index)?;
        let n = self.samples_per_window;
        Ok(&window[channel * n..(channel + 1) * n])
    }

    /// Number of windows labeled as seizure.
    pub fn positive_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == 1).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_2x2x3() -> WindowBatch {
        // 2 windows, 2 channels, 3 samples each
        let data: Vec<f32> = (0..12).map(|i| i as f32).collect();
        WindowBatch::new("rec", 10, 12, 2, 3, data, vec![0, 1]).unwrap()
    }

    #[test]
    fn test_batch_creation() {
        let batch = batch_2x2x3();
        assert_eq!(batch.window_count(), 2);
        assert_eq!(batch.window_len(), 6);
        assert_eq!(batch.positive_count(), 1);
    }

    #[test]
    fn test_window_views() {
        let batch = batch_2x2x3();
        assert_eq!(batch.window(0).unwrap(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(batch.window_channel(1, 0).unwrap(), &[6.0, 7.0, 8.0]);
        assert_eq!(batch.window_channel(1, 1).unwrap(), &[9.0, 10.0, 11.0]);
    }

    #[test]
    fn test_shape_validation() {
        let result = WindowBatch::new("rec", 0, 2, 2, 3, vec![0.0; 11], vec![0, 0]);
        assert!(result.is_err());

        let result = WindowBatch::new("rec", 0, 2, 2, 3, vec![0.0; 12], vec![0]);
        assert!(result.is_err());

        let result = WindowBatch::new("rec", 0, 2, 2, 3, vec![0.0; 12], vec![0, 2]);
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_bounds_access() {
        let batch = batch_2x2x3();
        assert!(batch.window(2).is_err());
        assert!(batch.window_channel(0, 2).is_err());
    }
}
