//! # Fast Fourier Transform (FFT) Module
//!
//! Computes the linear autocorrelation of an analysis frame in
//! `O(n log n)` using RustFFT. The frame is zero-padded to at least twice
//! its length so the circular correlation computed by the FFT does not
//! wrap around.

use rustfft::{num_complex::Complex, FftPlanner};

/// Reusable autocorrelation engine. Plans are cached by the planner, so
/// repeated calls with the same frame size do not re-plan.
pub struct Autocorrelator {
    planner: FftPlanner<f64>,
    scratch: Vec<Complex<f64>>,
}

impl Default for Autocorrelator {
    fn default() -> Self {
        Self::new()
    }
}

impl Autocorrelator {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            scratch: Vec::new(),
        }
    }

    /// Returns `r[lag] = sum_i x[i] * x[i + lag]` for `lag` in `0..signal.len()`.
    pub fn compute(&mut self, signal: &[f64]) -> Vec<f64> {
        let n = signal.len();
        if n == 0 {
            return Vec::new();
        }
        let fft_size = (2 * n).next_power_of_two();
        let forward = self.planner.plan_fft_forward(fft_size);
        let inverse = self.planner.plan_fft_inverse(fft_size);

        self.scratch.clear();
        self.scratch
            .extend(signal.iter().map(|&sample| Complex { re: sample, im: 0.0 }));
        self.scratch.resize(fft_size, Complex { re: 0.0, im: 0.0 });

        forward.process(&mut self.scratch);
        // Power spectrum; its inverse transform is the autocorrelation.
        for bin in self.scratch.iter_mut() {
            *bin = Complex {
                re: bin.norm_sqr(),
                im: 0.0,
            };
        }
        inverse.process(&mut self.scratch);

        let scale = 1.0 / fft_size as f64;
        self.scratch
            .iter()
            .take(n)
            .map(|bin| bin.re * scale)
            .collect()
    }
}
