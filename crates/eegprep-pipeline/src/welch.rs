//! Welch power spectral density estimation
//!
//! Windowed-segment averaging with a Hann window, 50% overlap, and
//! per-segment constant detrend. Output is a one-sided density in
//! units^2/Hz, suitable for integrating into band powers.

use eegprep_core::{EegError, EegResult};
use realfft::RealFftPlanner;
use std::f32::consts::PI;

/// One-sided power spectral density estimate.
#[derive(Debug, Clone)]
pub struct Psd {
    /// Frequency of each bin in Hz
    pub freqs: Vec<f32>,
    /// Density at each bin in units^2/Hz
    pub power: Vec<f32>,
}

/// Welch PSD estimator. Holds the real-FFT planner so every window of the
/// same length shares a plan.
pub struct WelchEstimator {
    planner: RealFftPlanner<f32>,
}

impl WelchEstimator {
    pub fn new() -> Self {
        Self {
            planner: RealFftPlanner::new(),
        }
    }

    /// Estimate the PSD of `x` sampled at `fs` Hz.
    ///
    /// `nperseg` is clamped to the signal length, mirroring the rule that
    /// short windows reduce the segment rather than failing.
    pub fn estimate(&mut self, x: &[f32], fs: f32, nperseg: usize) -> EegResult<Psd> {
        if x.is_empty() {
            return Err(EegError::InvalidSignalData {
                reason: "Cannot estimate PSD of an empty signal".to_string(),
            });
        }
        let nperseg = nperseg.min(x.len()).max(2);
        let noverlap = nperseg / 2;
        let step = nperseg - noverlap;

        // Periodic Hann window, as used for spectral averaging
        let window: Vec<f32> = (0..nperseg)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / nperseg as f32).cos())
            .collect();
        let win_sum_sq: f32 = window.iter().map(|w| w * w).sum();
        let scale = 1.0 / (fs * win_sum_sq);

        let fft = self.planner.plan_fft_forward(nperseg);
        let n_bins = nperseg / 2 + 1;
        let mut acc = vec![0.0f32; n_bins];
        let mut buffer = fft.make_input_vec();
        let mut spectrum = fft.make_output_vec();

        let mut n_segments = 0usize;
        let mut start = 0usize;
        while start + nperseg <= x.len() {
            let segment = &x[start..start + nperseg];
            let mean = segment.iter().sum::<f32>() / nperseg as f32;
            for (i, &s) in segment.iter().enumerate() {
                buffer[i] = (s - mean) * window[i];
            }
            fft.process(&mut buffer, &mut spectrum)
                .map_err(|e| EegError::InvalidSignalData {
                    reason: format!("FFT failed: {}", e),
                })?;

            for (k, bin) in spectrum.iter().enumerate() {
                let mut p = bin.norm_sqr() * scale;
                // One-sided spectrum: double everything except DC and
                // the Nyquist bin of an even-length segment
                let is_nyquist = nperseg % 2 == 0 && k == n_bins - 1;
                if k != 0 && !is_nyquist {
                    p *= 2.0;
                }
                acc[k] += p;
            }
            n_segments += 1;
            start += step;
        }

        let norm = 1.0 / n_segments.max(1) as f32;
        let power: Vec<f32> = acc.iter().map(|p| p * norm).collect();
        let freqs: Vec<f32> = (0..n_bins)
            .map(|k| k as f32 * fs / nperseg as f32)
            .collect();

        Ok(Psd { freqs, power })
    }
}

impl Default for WelchEstimator {
    fn default() -> Self {
        Self::new()
    }
}

/// Integrate a PSD over `[low, high]` inclusive with the trapezoidal rule.
///
/// A band that captures no frequency bin (or a single bin, which has zero
/// trapezoidal width) contributes exactly 0.0.
pub fn band_power(psd: &Psd, low: f32, high: f32) -> f32 {
    let in_band: Vec<usize> = psd
        .freqs
        .iter()
        .enumerate()
        .filter(|(_, &f)| f >= low && f <= high)
        .map(|(i, _)| i)
        .collect();

    if in_band.len() < 2 {
        return 0.0;
    }

    let mut total = 0.0f32;
    for pair in in_band.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let df = psd.freqs[b] - psd.freqs[a];
        total += 0.5 * (psd.power[a] + psd.power[b]) * df;
    }
    total
}
