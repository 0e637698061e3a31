//! Pipeline configuration
//!
//! Every tunable of the preparation pipeline lives here as an explicit
//! parameter with a documented default; the engines take a config rather
//! than reading ambient constants.

use eegprep_core::{EegError, EegResult};
use serde::{Deserialize, Serialize};

/// Frequency band definition for band-power features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub name: String,
    pub low_freq: f32,
    pub high_freq: f32,
}

impl FrequencyBand {
    pub fn new(name: &str, low_freq: f32, high_freq: f32) -> Self {
        Self {
            name: name.to_string(),
            low_freq,
            high_freq,
        }
    }

    /// The five clinical EEG bands, in the fixed feature order.
    pub fn eeg_bands() -> Vec<FrequencyBand> {
        vec![
            FrequencyBand::new("delta", 0.5, 4.0),
            FrequencyBand::new("theta", 4.0, 8.0),
            FrequencyBand::new("alpha", 8.0, 13.0),
            FrequencyBand::new("beta", 13.0, 30.0),
            FrequencyBand::new("gamma", 30.0, 60.0),
        ]
    }
}

/// Configuration for the full preparation pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Common sampling rate every window is resampled to (Hz)
    pub target_rate: u32,
    /// Window duration in seconds
    pub window_sec: u32,
    /// Channel count every output window must have. Recordings with more
    /// channels are truncated to the first `canonical_channels`; recordings
    /// with fewer are rejected.
    pub canonical_channels: usize,
    /// Windows per chunk; bounds peak memory to one chunk
    pub chunk_windows: usize,
    /// Frequency bands for band-power features, in feature order
    pub bands: Vec<FrequencyBand>,
    /// Welch PSD segment length in samples (clamped to the window length)
    pub psd_segment_len: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_rate: 128,
            window_sec: 15,
            canonical_channels: 23,
            chunk_windows: 1000,
            bands: FrequencyBand::eeg_bands(),
            psd_segment_len: 256,
        }
    }
}

impl PipelineConfig {
    /// Samples per window at the target rate.
    pub fn window_samples(&self) -> usize {
        (self.window_sec * self.target_rate) as usize
    }

    /// Features per channel: mean, std, min, max, line length, one power
    /// value per band.
    pub fn features_per_channel(&self) -> usize {
        4 + 1 + self.bands.len()
    }

    /// Fixed feature-vector length for one window.
    pub fn feature_len(&self) -> usize {
        self.canonical_channels * self.features_per_channel()
    }

    pub fn validate(&self) -> EegResult<()> {
        if self.target_rate == 0 {
            return Err(EegError::InvalidConfig {
                message: "Target rate must be positive".to_string(),
            });
        }
        if self.window_sec == 0 {
            return Err(EegError::InvalidConfig {
                message: "Window duration must be positive".to_string(),
            });
        }
        if self.canonical_channels == 0 {
            return Err(EegError::InvalidConfig {
                message: "Canonical channel count must be positive".to_string(),
            });
        }
        if self.chunk_windows == 0 {
            return Err(EegError::InvalidConfig {
                message: "Chunk size must be at least one window".to_string(),
            });
        }
        if self.psd_segment_len == 0 {
            return Err(EegError::InvalidConfig {
                message: "PSD segment length must be positive".to_string(),
            });
        }
        if self.bands.is_empty() {
            return Err(EegError::InvalidConfig {
                message: "At least one frequency band is required".to_string(),
            });
        }
        for band in &self.bands {
            if band.low_freq < 0.0 || band.high_freq <= band.low_freq {
                return Err(EegError::InvalidConfig {
                    message: format!(
                        "Band '{}' has invalid range [{}, {}]",
                        band.name, band.low_freq, band.high_freq
                    ),
                });
            }
        }
        Ok(())
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> EegResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| EegError::InvalidConfig {
            message: format!("Failed to serialize configuration: {}", e),
        })
    }

    /// Import configuration from JSON
    pub fn from_json(json: &str) -> EegResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| EegError::InvalidConfig {
            message: format!("Failed to deserialize configuration: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }
}
