//! FFT-domain rate conversion
//!
//! Resamples one channel of one chunk from the recording's native rate to
//! the target rate by truncating or zero-padding the spectrum. The output
//! length is exact (`round(n * target / source)`), which is what lets the
//! windowing engine split a resampled chunk evenly into whole windows.

use num_complex::Complex;
use rustfft::FftPlanner;

/// Spectral resampler. Holds the FFT planner so repeated chunks of the
/// same length reuse their plans.
pub struct Resampler {
    planner: FftPlanner<f32>,
}

impl Resampler {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Exact output length for resampling `n_in` samples between rates.
    pub fn output_len(n_in: usize, source_rate: f32, target_rate: f32) -> usize {
        (n_in as f64 * target_rate as f64 / source_rate as f64).round() as usize
    }

    /// Resample `input` to exactly `n_out` samples.
    ///
    /// Spectrum truncation acts as the anti-aliasing filter when
    /// downsampling; zero-padding interpolates when upsampling.
    pub fn resample(&mut self, input: &[f32], n_out: usize) -> Vec<f32> {
        let n = input.len();
        if n == 0 || n_out == 0 {
            return vec![0.0; n_out];
        }
        if n == n_out {
            return input.to_vec();
        }

        let forward = self.planner.plan_fft_forward(n);
        let mut spectrum: Vec<Complex<f32>> =
            input.iter().map(|&x| Complex::new(x, 0.0)).collect();
        forward.process(&mut spectrum);

        let m = n_out;
        let mut out_spectrum = vec![Complex::new(0.0, 0.0); m];
        let k = n.min(m);
        let nyq = k / 2 + 1;

        out_spectrum[..nyq].copy_from_slice(&spectrum[..nyq]);
        let neg = k - nyq; // negative-frequency bins carried over
        for i in 1..=neg {
            out_spectrum[m - i] = spectrum[n - i];
        }

        // Shared Nyquist bin when the smaller length is even
        if k % 2 == 0 {
            let half = k / 2;
            if m < n {
                // Downsampling: fold the mirrored component in
                out_spectrum[half] += spectrum[n - half];
            } else {
                // Upsampling: split between the two mirrored bins
                out_spectrum[half] *= 0.5;
                out_spectrum[m - half] = out_spectrum[half];
            }
        }

        let inverse = self.planner.plan_fft_inverse(m);
        inverse.process(&mut out_spectrum);

        // rustfft leaves both transforms unnormalized; 1/n restores the
        // signal at the new rate
        let scale = 1.0 / n as f32;
        out_spectrum.iter().map(|c| c.re * scale).collect()
    }
}

impl Default for Resampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_output_len() {
        assert_eq!(Resampler::output_len(3840, 256.0, 128.0), 1920);
        assert_eq!(Resampler::output_len(1000, 200.0, 128.0), 640);
    }

    #[test]
    fn test_identity_when_rates_match() {
        let mut resampler = Resampler::new();
        let input = vec![1.0, -2.0, 3.0, 0.5];
        assert_eq!(resampler.resample(&input, 4), input);
    }

    #[test]
    fn test_constant_signal_preserved() {
        let mut resampler = Resampler::new();
        let input = vec![2.5; 256];
        let output = resampler.resample(&input, 128);
        assert_eq!(output.len(), 128);
        for &y in &output {
            assert!((y - 2.5).abs() < 1e-4);
        }
    }

    #[test]
    fn test_sine_downsample() {
        // 4 Hz sine over 1s at 256 Hz resampled to 128 Hz must still be
        // a 4 Hz sine sampled at 128 Hz.
        let mut resampler = Resampler::new();
        let input: Vec<f32> = (0..256)
            .map(|i| (2.0 * PI * 4.0 * i as f32 / 256.0).sin())
            .collect();
        let output = resampler.resample(&input, 128);
        assert_eq!(output.len(), 128);
        for (i, &y) in output.iter().enumerate() {
            let expected = (2.0 * PI * 4.0 * i as f32 / 128.0).sin();
            assert!(
                (y - expected).abs() < 1e-3,
                "sample {}: got {}, expected {}",
                i,
                y,
                expected
            );
        }
    }

    #[test]
    fn test_upsample_length() {
        let mut resampler = Resampler::new();
        let input: Vec<f32> = (0..100).map(|i| (i as f32 * 0.1).sin()).collect();
        let output = resampler.resample(&input, 250);
        assert_eq!(output.len(), 250);
    }
}
