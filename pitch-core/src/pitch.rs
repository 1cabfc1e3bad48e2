//! # Pitch Detection Module
//!
//! Estimates the fundamental frequency of a windowed analysis frame.
//!
//! Two interchangeable strategies implement [`PitchEstimator`]:
//! - [`YinEstimator`], the default: cumulative mean normalized difference
//!   with parabolic refinement. The normalization suppresses the
//!   subharmonic bias of raw autocorrelation peak picking.
//! - [`AutocorrelationEstimator`]: normalized autocorrelation peak picking
//!   over a bounded period range. Cheaper and less precise.
//!
//! Both reject short frames and silent frames before doing any real work.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::fft::Autocorrelator;

/// Selects which estimator a pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorKind {
    /// Cumulative mean normalized difference (YIN).
    #[default]
    Yin,
    /// Normalized autocorrelation with a confidence threshold.
    Autocorrelation,
}

impl EstimatorKind {
    /// Builds the estimator described by `config`.
    pub fn build(self, config: &PipelineConfig) -> Box<dyn PitchEstimator> {
        match self {
            EstimatorKind::Yin => Box::new(YinEstimator::from_config(config)),
            EstimatorKind::Autocorrelation => {
                Box::new(AutocorrelationEstimator::from_config(config))
            }
        }
    }
}

/// A period estimator that turns one analysis frame into a frequency.
pub trait PitchEstimator: Send {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Estimates the fundamental frequency of `frame` in Hz.
    ///
    /// Returns `None` when no reliable pitch is present. A returned
    /// frequency is always finite and positive.
    fn estimate(&mut self, frame: &[f64], sample_rate: u32) -> Option<f64>;
}

/// Root mean square of a signal. Zero for an empty slice.
pub fn rms(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|&s| s * s).sum::<f64>() / signal.len() as f64).sqrt()
}

/// Cheap pre-checks shared by both estimators.
#[derive(Debug, Clone, Copy)]
struct FrameGate {
    min_frame_len: usize,
    silence_rms: f64,
}

impl FrameGate {
    fn admits(&self, frame: &[f64]) -> bool {
        if frame.len() < self.min_frame_len {
            debug!(
                "[PITCH] frame of {} samples is below the minimum of {}",
                frame.len(),
                self.min_frame_len
            );
            return false;
        }
        let level = rms(frame);
        if level < self.silence_rms {
            debug!("[PITCH] frame rejected as silence (rms {:.5})", level);
            return false;
        }
        true
    }
}

/// Fits a parabola through `(tau-1, tau, tau+1)` and returns the abscissa
/// of its vertex, or `None` when the three points are collinear.
fn parabolic_vertex(prev: f64, center: f64, next: f64, tau: usize) -> Option<f64> {
    let denominator = 2.0 * (2.0 * center - next - prev);
    if denominator.abs() < f64::EPSILON {
        return None;
    }
    Some(tau as f64 + (next - prev) / denominator)
}

fn frequency_from_period(sample_rate: u32, period: f64) -> Option<f64> {
    let frequency = sample_rate as f64 / period;
    (period > 0.0 && frequency.is_finite() && frequency > 0.0).then_some(frequency)
}

/// YIN period estimator.
///
/// For a frame of length `L`, `tau_max = L / 2`. The difference function
/// `d(tau)` sums squared differences over the first `tau_max` samples and
/// is normalized by its running mean. The first dip below `threshold` is
/// followed down to its local minimum, then refined by parabolic
/// interpolation.
#[derive(Debug, Clone)]
pub struct YinEstimator {
    threshold: f64,
    gate: FrameGate,
    yin_buffer: Vec<f64>,
}

impl YinEstimator {
    pub fn new(threshold: f64, min_frame_len: usize, silence_rms: f64) -> Self {
        Self {
            threshold,
            gate: FrameGate {
                min_frame_len,
                silence_rms,
            },
            yin_buffer: Vec::new(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.yin_threshold,
            config.min_frame_len,
            config.silence_rms,
        )
    }

    /// The cumulative mean normalized difference of the last analysed frame.
    pub fn cmnd(&self) -> &[f64] {
        &self.yin_buffer
    }

    fn fill_cmnd(&mut self, signal: &[f64]) {
        let tau_max = signal.len() / 2;
        self.yin_buffer.clear();
        self.yin_buffer.resize(tau_max, 0.0);

        // Difference function.
        for tau in 1..tau_max {
            let mut diff = 0.0;
            for i in 0..tau_max {
                let delta = signal[i] - signal[i + tau];
                diff += delta * delta;
            }
            self.yin_buffer[tau] = diff;
        }

        // Cumulative mean normalization.
        self.yin_buffer[0] = 1.0;
        let mut running_sum = 0.0;
        for tau in 1..tau_max {
            running_sum += self.yin_buffer[tau];
            if running_sum > 0.0 {
                self.yin_buffer[tau] *= tau as f64 / running_sum;
            } else {
                self.yin_buffer[tau] = 1.0;
            }
        }
    }

    fn find_period(&self) -> Option<usize> {
        let tau_max = self.yin_buffer.len();
        let mut tau = (2..tau_max).find(|&tau| self.yin_buffer[tau] < self.threshold)?;
        while tau + 1 < tau_max && self.yin_buffer[tau + 1] < self.yin_buffer[tau] {
            tau += 1;
        }
        Some(tau)
    }
}

impl PitchEstimator for YinEstimator {
    fn name(&self) -> &'static str {
        "yin"
    }

    fn estimate(&mut self, frame: &[f64], sample_rate: u32) -> Option<f64> {
        if !self.gate.admits(frame) {
            return None;
        }
        self.fill_cmnd(frame);

        let Some(tau) = self.find_period() else {
            debug!("[PITCH] yin threshold {} never crossed", self.threshold);
            return None;
        };
        // The refinement needs both neighbours.
        if tau + 1 >= self.yin_buffer.len() {
            return None;
        }
        let period = parabolic_vertex(
            self.yin_buffer[tau - 1],
            self.yin_buffer[tau],
            self.yin_buffer[tau + 1],
            tau,
        )?;
        frequency_from_period(sample_rate, period)
    }
}

/// Normalized autocorrelation estimator.
///
/// Searches lags between `sample_rate / max_frequency` and
/// `sample_rate / min_frequency` for the highest correlation relative to
/// lag zero, skipping the main lobe around lag zero. Peaks below
/// `confidence` are rejected.
pub struct AutocorrelationEstimator {
    min_frequency: f64,
    max_frequency: f64,
    confidence: f64,
    gate: FrameGate,
    autocorrelator: Autocorrelator,
}

impl AutocorrelationEstimator {
    pub fn new(
        min_frequency: f64,
        max_frequency: f64,
        confidence: f64,
        min_frame_len: usize,
        silence_rms: f64,
    ) -> Self {
        Self {
            min_frequency,
            max_frequency,
            confidence,
            gate: FrameGate {
                min_frame_len,
                silence_rms,
            },
            autocorrelator: Autocorrelator::new(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.autocorr_min_frequency,
            config.autocorr_max_frequency,
            config.autocorr_confidence,
            config.min_frame_len,
            config.silence_rms,
        )
    }
}

impl PitchEstimator for AutocorrelationEstimator {
    fn name(&self) -> &'static str {
        "autocorrelation"
    }

    fn estimate(&mut self, frame: &[f64], sample_rate: u32) -> Option<f64> {
        if !self.gate.admits(frame) {
            return None;
        }
        let correlation = self.autocorrelator.compute(frame);
        let energy = correlation[0];
        if energy <= 0.0 {
            return None;
        }

        let sr = sample_rate as f64;
        // Floor so the lag just below the true period of a tone at the
        // upper limit stays searchable; interpolation reads `lag - 1`.
        let min_lag = ((sr / self.max_frequency).floor() as usize).max(2);
        let max_lag = ((sr / self.min_frequency).floor() as usize).min(correlation.len() - 2);
        // Peaks inside the zero-lag lobe are not periods.
        let first_negative = correlation.iter().position(|&r| r < 0.0)?;
        let start = min_lag.max(first_negative);
        if start > max_lag {
            return None;
        }

        // Only interior local maxima count, so a falling edge at the lower
        // bound cannot beat the real peak.
        let (lag, peak) = (start..=max_lag)
            .filter(|&lag| {
                correlation[lag] >= correlation[lag - 1] && correlation[lag] >= correlation[lag + 1]
            })
            .map(|lag| (lag, correlation[lag]))
            .max_by(|a, b| a.1.total_cmp(&b.1))?;

        let normalized = peak / energy;
        if normalized < self.confidence {
            debug!(
                "[PITCH] autocorrelation peak {:.3} below confidence {}",
                normalized, self.confidence
            );
            return None;
        }

        let period = parabolic_vertex(
            correlation[lag - 1],
            correlation[lag],
            correlation[lag + 1],
            lag,
        )?;
        frequency_from_period(sample_rate, period)
    }
}
