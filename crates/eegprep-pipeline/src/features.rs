//! Per-window feature extraction
//!
//! Maps one fixed-shape window to one fixed-length feature vector:
//! per channel, in order, mean, std, min, max, line length, then the
//! Welch band power of each configured frequency band. Channel-major:
//! all of channel 0's features, then channel 1's, and so on.

use crate::config::{FrequencyBand, PipelineConfig};
use crate::welch::{band_power, WelchEstimator};
use eegprep_core::{EegError, EegResult};

/// Feature extractor for labeled windows. Deterministic: the same window
/// always yields the same vector. Holds the PSD estimator so FFT plans
/// are shared across windows.
pub struct FeatureExtractor {
    target_rate: f32,
    bands: Vec<FrequencyBand>,
    psd_segment_len: usize,
    welch: WelchEstimator,
}

impl FeatureExtractor {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            target_rate: config.target_rate as f32,
            bands: config.bands.clone(),
            psd_segment_len: config.psd_segment_len,
            welch: WelchEstimator::new(),
        }
    }

    /// Features produced per channel.
    pub fn features_per_channel(&self) -> usize {
        4 + 1 + self.bands.len()
    }

    /// Fixed vector length for a window with `channels` channels.
    pub fn expected_len(&self, channels: usize) -> usize {
        channels * self.features_per_channel()
    }

    /// Extract the feature vector for one channel-major window of
    /// `channels * samples` values.
    pub fn extract(
        &mut self,
        window: &[f32],
        channels: usize,
        samples: usize,
    ) -> EegResult<Vec<f32>> {
        if window.len() != channels * samples {
            return Err(EegError::ShapeMismatch {
                reason: format!(
                    "window length {} doesn't match {} channels x {} samples",
                    window.len(),
                    channels,
                    samples
                ),
            });
        }
        if samples == 0 {
            return Err(EegError::InvalidSignalData {
                reason: "cannot extract features from an empty window".to_string(),
            });
        }

        let mut features = Vec::with_capacity(self.expected_len(channels));
        for ch in 0..channels {
            let x = &window[ch * samples..(ch + 1) * samples];
            let (mean, std) = mean_std(x);
            features.push(mean);
            features.push(std);
            features.push(x.iter().fold(f32::INFINITY, |a, &b| a.min(b)));
            features.push(x.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b)));
            features.push(line_length(x));

            let psd = self.welch.estimate(x, self.target_rate, self.psd_segment_len)?;
            for band in &self.bands {
                features.push(band_power(&psd, band.low_freq, band.high_freq));
            }
        }

        Ok(features)
    }
}

fn mean_std(x: &[f32]) -> (f32, f32) {
    let n = x.len() as f32;
    let mean = x.iter().sum::<f32>() / n;
    let var = x.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
    (mean, var.sqrt())
}

/// Sum of absolute first differences: total vertical travel of the trace.
fn line_length(x: &[f32]) -> f32 {
    x.windows(2).map(|w| (w[1] - w[0]).abs()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn extractor(canonical: usize) -> FeatureExtractor {
        let config = PipelineConfig {
            canonical_channels: canonical,
            ..PipelineConfig::default()
        };
        FeatureExtractor::new(&config)
    }

    fn deterministic_window(channels: usize, samples: usize) -> Vec<f32> {
        (0..channels * samples)
            .map(|i| ((i * 31 % 101) as f32) * 0.05 - 2.0)
            .collect()
    }

    #[test]
    fn test_vector_length_23_channels() {
        let mut extractor = extractor(23);
        let window = deterministic_window(23, 1920);
        let features = extractor.extract(&window, 23, 1920).unwrap();
        assert_eq!(features.len(), 230);
        assert_eq!(extractor.expected_len(23), 230);
    }

    #[test]
    fn test_determinism() {
        let mut extractor = extractor(4);
        let window = deterministic_window(4, 512);
        let first = extractor.extract(&window, 4, 512).unwrap();
        let second = extractor.extract(&window, 4, 512).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_time_domain_values() {
        let mut extractor = extractor(1);
        // Single channel, hand-computable stats
        let window = vec![0.0, 1.0, -1.0, 2.0];
        let features = extractor.extract(&window, 1, 4).unwrap();

        assert!((features[0] - 0.5).abs() < 1e-6); // mean
        let expected_std = (0.25f32 + 0.25 + 2.25 + 2.25).sqrt() / 2.0; // sqrt(var), var = 1.25
        assert!((features[1] - expected_std).abs() < 1e-5);
        assert_eq!(features[2], -1.0); // min
        assert_eq!(features[3], 2.0); // max
        assert_eq!(features[4], 6.0); // |1| + |-2| + |3|
    }

    #[test]
    fn test_band_power_concentrates_on_sine() {
        let mut extractor = extractor(1);
        let samples = 1920;
        let window: Vec<f32> = (0..samples)
            .map(|i| (2.0 * PI * 10.0 * i as f32 / 128.0).sin())
            .collect();
        let features = extractor.extract(&window, 1, samples).unwrap();

        // Band powers sit at indices 5..10: delta, theta, alpha, beta, gamma
        let alpha = features[7];
        for idx in [5, 6, 8, 9] {
            assert!(
                alpha > 10.0 * features[idx],
                "alpha {} should dominate band index {} = {}",
                alpha,
                idx,
                features[idx]
            );
        }
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let mut extractor = extractor(2);
        let window = vec![0.0; 100];
        assert!(extractor.extract(&window, 2, 51).is_err());
        assert!(extractor.extract(&window, 2, 0).is_err());
    }

    #[test]
    fn test_channel_major_ordering() {
        let mut extractor = extractor(2);
        let samples = 256;
        // Channel 0 constant, channel 1 ramp: their stats must land in
        // their own 10-wide blocks.
        let mut window = vec![1.0f32; samples];
        window.extend((0..samples).map(|i| i as f32));
        let features = extractor.extract(&window, 2, samples).unwrap();

        assert_eq!(features.len(), 20);
        assert!((features[0] - 1.0).abs() < 1e-6); // ch0 mean
        assert_eq!(features[4], 0.0); // ch0 line length
        assert!((features[10] - 127.5).abs() < 1e-3); // ch1 mean
        assert_eq!(features[14], 255.0); // ch1 line length
    }
}
