//! # Window Function Module
//!
//! Tapers an analysis frame before period estimation to suppress spectral
//! leakage from the frame edges.

use std::f64::consts::PI;

/// Tapers an analysis frame in place before it reaches a period estimator.
///
/// Uses the symmetric Hann form, `0.5 * (1 - cos(2*pi*i / (L - 1)))`, so the
/// first and last samples of every frame go to zero and the wrap-around jump
/// at the frame edges cannot correlate with the start of the frame. Frames
/// shorter than two samples have no edges to taper and are left unchanged.
pub fn apply_hann_window(frame: &mut [f64]) {
    if frame.len() < 2 {
        return;
    }
    let step = 2.0 * PI / (frame.len() - 1) as f64;
    for (i, sample) in frame.iter_mut().enumerate() {
        *sample *= 0.5 - 0.5 * (step * i as f64).cos();
    }
}

/// Returns a Hann-windowed copy of `frame`.
pub fn hann(frame: &[f64]) -> Vec<f64> {
    let mut windowed = frame.to_vec();
    apply_hann_window(&mut windowed);
    windowed
}
