//! Windowing & labeling engine
//!
//! Streams a recording chunk by chunk, so peak memory is bounded by
//! `chunk_windows` regardless of recording length. Each chunk is read,
//! reduced to the canonical channel set, resampled to the target rate,
//! split into fixed windows, labeled against the seizure intervals, and
//! normalized with chunk-local statistics before being handed to the sink.

use crate::config::PipelineConfig;
use crate::resample::Resampler;
use eegprep_core::{EegError, EegResult, RecordingReader, SeizureInterval, WindowBatch};
use tracing::debug;

/// The windowing engine. Owns the resampler so FFT plans are reused
/// across chunks and recordings.
pub struct WindowingEngine {
    config: PipelineConfig,
    resampler: Resampler,
}

impl WindowingEngine {
    pub fn new(config: PipelineConfig) -> EegResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            resampler: Resampler::new(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one recording into labeled window batches, emitting each
    /// chunk through `sink` before the next chunk is read. Back-pressure
    /// is the caller's: the engine never holds more than one chunk.
    ///
    /// Fails fast on the whole recording if the channel count is below
    /// canonical or the source is too short for a single window; the
    /// caller decides whether that skips the file or aborts.
    pub fn process<R, F>(
        &mut self,
        reader: &mut R,
        intervals: &[SeizureInterval],
        mut sink: F,
    ) -> EegResult<()>
    where
        R: RecordingReader,
        F: FnMut(WindowBatch) -> EegResult<()>,
    {
        let canonical = self.config.canonical_channels;
        if reader.channel_count() < canonical {
            return Err(EegError::ChannelCountBelowCanonical {
                found: reader.channel_count(),
                canonical,
            });
        }

        let source_rate = reader.sample_rate();
        if source_rate <= 0.0 {
            return Err(EegError::InvalidSignalData {
                reason: format!("non-positive sampling rate {}", source_rate),
            });
        }

        // Window size in source samples preserves window_sec of real time
        // at the native rate; resampling happens per chunk, after slicing.
        let source_window = (self.config.window_sec as f32 * source_rate).round() as usize;
        if source_window == 0 {
            return Err(EegError::InvalidSignalData {
                reason: "window shorter than one source sample".to_string(),
            });
        }
        let total_windows = reader.sample_count() / source_window;

        // Closed window-index bounds of every interval for this recording
        let bounds: Vec<(usize, usize)> = intervals
            .iter()
            .filter(|iv| iv.matches_recording(reader.id()))
            .map(|iv| iv.window_bounds(self.config.window_sec as u64))
            .collect();

        debug!(
            recording = reader.id(),
            total_windows,
            source_window,
            intervals = bounds.len(),
            "windowing recording"
        );

        let mut start_win = 0;
        while start_win < total_windows {
            let stop_win = (start_win + self.config.chunk_windows).min(total_windows);
            let batch =
                self.process_chunk(reader, source_window, start_win, stop_win, &bounds)?;
            sink(batch)?;
            start_win = stop_win;
        }

        Ok(())
    }

    fn process_chunk<R: RecordingReader>(
        &mut self,
        reader: &mut R,
        source_window: usize,
        start_win: usize,
        stop_win: usize,
        bounds: &[(usize, usize)],
    ) -> EegResult<WindowBatch> {
        let n_windows = stop_win - start_win;
        let window_samples = self.config.window_samples();
        let canonical = self.config.canonical_channels;

        let start_sample = start_win * source_window;
        let stop_sample = stop_win * source_window;
        let channels = reader.read_range(start_sample, stop_sample)?;
        let channels = apply_channel_policy(channels, canonical)?;

        // One chunk covers n_windows * window_sec seconds, so the exact
        // resampled length is a whole number of target-rate windows.
        let n_out = n_windows * window_samples;
        let mut data = vec![0.0f32; n_windows * canonical * window_samples];
        for (ch, samples) in channels.iter().enumerate() {
            let resampled = self.resampler.resample(samples, n_out);
            for w in 0..n_windows {
                let dst_start = w * canonical * window_samples + ch * window_samples;
                let src_start = w * window_samples;
                data[dst_start..dst_start + window_samples]
                    .copy_from_slice(&resampled[src_start..src_start + window_samples]);
            }
        }

        let labels = label_windows(start_win, stop_win, bounds);
        normalize_chunk(&mut data, n_windows, canonical * window_samples);

        debug!(
            recording = reader.id(),
            start_win,
            stop_win,
            positives = labels.iter().filter(|&&l| l == 1).count(),
            "chunk processed"
        );

        WindowBatch::new(
            reader.id(),
            start_win,
            stop_win,
            canonical,
            window_samples,
            data,
            labels,
        )
    }
}

/// Enforce the canonical channel policy: recordings with extra channels
/// keep the first `canonical` in source order; recordings with fewer are
/// rejected outright rather than padded with synthetic channels.
pub(crate) fn apply_channel_policy(
    mut channels: Vec<Vec<f32>>,
    canonical: usize,
) -> EegResult<Vec<Vec<f32>>> {
    if channels.len() < canonical {
        return Err(EegError::ChannelCountBelowCanonical {
            found: channels.len(),
            canonical,
        });
    }
    channels.truncate(canonical);
    Ok(channels)
}

/// Label every window in `[start_win, stop_win)` against the closed
/// window-index bounds of the recording's intervals. Overlapping intervals
/// OR together; a label stays 1 once set.
pub(crate) fn label_windows(
    start_win: usize,
    stop_win: usize,
    bounds: &[(usize, usize)],
) -> Vec<i8> {
    let mut labels = vec![0i8; stop_win - start_win];
    let chunk_last = stop_win - 1;
    for &(start_label, end_label) in bounds {
        let overlap_start = start_label.max(start_win);
        let overlap_end = end_label.min(chunk_last);
        if overlap_start <= overlap_end {
            for label in &mut labels[overlap_start - start_win..=overlap_end - start_win] {
                *label = 1;
            }
        }
    }
    labels
}

/// Z-score each flattened-window column using statistics from this chunk's
/// windows only. Statistics are deliberately chunk-local: there is no
/// cross-chunk continuity guarantee. A zero-variance column keeps a unit
/// divisor and collapses to zero instead of producing NaN.
pub(crate) fn normalize_chunk(data: &mut [f32], n_windows: usize, window_len: usize) {
    if n_windows == 0 || window_len == 0 {
        return;
    }
    let n = n_windows as f32;
    for col in 0..window_len {
        let mut sum = 0.0f32;
        for w in 0..n_windows {
            sum += data[w * window_len + col];
        }
        let mean = sum / n;

        let mut var = 0.0f32;
        for w in 0..n_windows {
            let d = data[w * window_len + col] - mean;
            var += d * d;
        }
        let std = (var / n).sqrt();
        let divisor = if std > 0.0 { std } else { 1.0 };

        for w in 0..n_windows {
            let v = &mut data[w * window_len + col];
            *v = (*v - mean) / divisor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eegprep_core::InMemoryRecording;

    fn small_config(canonical: usize, chunk_windows: usize) -> PipelineConfig {
        PipelineConfig {
            target_rate: 128,
            window_sec: 15,
            canonical_channels: canonical,
            chunk_windows,
            ..PipelineConfig::default()
        }
    }

    fn ramp_recording(id: &str, channels: usize, rate: f32, samples: usize) -> InMemoryRecording {
        let data = (0..channels)
            .map(|ch| {
                (0..samples)
                    .map(|i| ((i % 97) as f32) * 0.1 + ch as f32)
                    .collect()
            })
            .collect();
        InMemoryRecording::new(id, rate, data).unwrap()
    }

    #[test]
    fn test_window_conservation_across_chunks() {
        // 10.5 windows of source data must produce exactly 10 windows,
        // regardless of how chunking cuts them.
        let mut engine = WindowingEngine::new(small_config(2, 3)).unwrap();
        let samples = (10.5 * 15.0 * 256.0) as usize;
        let mut rec = ramp_recording("rec_a", 2, 256.0, samples);

        let mut counts = Vec::new();
        engine
            .process(&mut rec, &[], |batch| {
                counts.push(batch.window_count());
                Ok(())
            })
            .unwrap();

        assert_eq!(counts, vec![3, 3, 3, 1]);
        assert_eq!(counts.iter().sum::<usize>(), 10);
    }

    #[test]
    fn test_label_fixture_10s_to_40s() {
        // Interval (10s, 40s) with 15s windows -> windows 0..=2 labeled.
        let mut engine = WindowingEngine::new(small_config(2, 1000)).unwrap();
        let samples = 5 * 15 * 128;
        let mut rec = ramp_recording("chb01_03", 2, 128.0, samples);
        let intervals = vec![SeizureInterval::new("chb01_03.edf", 10, 40)];

        let mut labels = Vec::new();
        engine
            .process(&mut rec, &intervals, |batch| {
                labels.extend_from_slice(&batch.labels);
                Ok(())
            })
            .unwrap();

        assert_eq!(labels, vec![1, 1, 1, 0, 0]);
    }

    #[test]
    fn test_overlapping_intervals_or_together() {
        let labels = label_windows(0, 6, &[(0, 2), (2, 4)]);
        assert_eq!(labels, vec![1, 1, 1, 1, 1, 0]);
    }

    #[test]
    fn test_label_intersection_with_chunk_range() {
        // Interval covering windows 5..=8 seen from chunk [6, 8)
        let labels = label_windows(6, 8, &[(5, 8)]);
        assert_eq!(labels, vec![1, 1]);
        // Chunk entirely before the interval
        let labels = label_windows(0, 4, &[(5, 8)]);
        assert_eq!(labels, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_channel_truncation_preserves_order() {
        let channels = vec![
            vec![0.0, 0.1],
            vec![1.0, 1.1],
            vec![2.0, 2.1],
            vec![3.0, 3.1],
        ];
        let kept = apply_channel_policy(channels, 2).unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0], vec![0.0, 0.1]);
        assert_eq!(kept[1], vec![1.0, 1.1]);
    }

    #[test]
    fn test_below_canonical_rejected() {
        let mut engine = WindowingEngine::new(small_config(23, 1000)).unwrap();
        let mut rec = ramp_recording("rec_small", 18, 256.0, 15 * 256 * 2);

        let result = engine.process(&mut rec, &[], |_| Ok(()));
        assert!(matches!(
            result,
            Err(EegError::ChannelCountBelowCanonical {
                found: 18,
                canonical: 23
            })
        ));
    }

    #[test]
    fn test_normalization_zero_mean_unit_variance() {
        // 4 windows x 3 columns with per-column spread
        let mut data = vec![
            1.0, 10.0, 5.0, //
            2.0, 20.0, 5.0, //
            3.0, 30.0, 5.0, //
            4.0, 40.0, 5.0,
        ];
        normalize_chunk(&mut data, 4, 3);

        for col in 0..3 {
            let column: Vec<f32> = (0..4).map(|w| data[w * 3 + col]).collect();
            let mean: f32 = column.iter().sum::<f32>() / 4.0;
            let var: f32 = column.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / 4.0;
            assert!(mean.abs() < 1e-5, "column {} mean {}", col, mean);
            if col < 2 {
                assert!((var - 1.0).abs() < 1e-4, "column {} variance {}", col, var);
            } else {
                // Zero-variance column collapses to zero, never NaN
                assert!(column.iter().all(|v| *v == 0.0));
            }
            assert!(column.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_resampled_window_shape() {
        // 256 Hz source to 128 Hz target: windows come out at
        // window_sec * target_rate samples exactly.
        let mut engine = WindowingEngine::new(small_config(2, 1000)).unwrap();
        let mut rec = ramp_recording("rec_b", 3, 256.0, 4 * 15 * 256);

        let mut batches = Vec::new();
        engine
            .process(&mut rec, &[], |batch| {
                batches.push(batch);
                Ok(())
            })
            .unwrap();

        assert_eq!(batches.len(), 1);
        let batch = &batches[0];
        assert_eq!(batch.window_count(), 4);
        assert_eq!(batch.channels, 2); // truncated from 3
        assert_eq!(batch.samples_per_window, 1920);
        assert_eq!(batch.data.len(), 4 * 2 * 1920);
    }
}
