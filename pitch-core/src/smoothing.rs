//! # Smoothing Module
//!
//! Short analysis windows make any period estimator prone to locking onto
//! the first or second harmonic for a frame or two. [`PitchPostProcessor`]
//! damps that flicker with a median over the last few raw estimates and an
//! octave correction against the previous stable output.

use std::collections::VecDeque;

use log::debug;

use crate::config::PipelineConfig;

/// Median smoothing and octave correction over successive estimates.
#[derive(Debug, Clone)]
pub struct PitchPostProcessor {
    history: VecDeque<f64>,
    capacity: usize,
    octave_tolerance: f64,
    last_stable: Option<f64>,
}

impl PitchPostProcessor {
    /// Creates a processor keeping `capacity` raw estimates.
    pub fn new(capacity: usize, octave_tolerance: f64) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            octave_tolerance,
            last_stable: None,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.history_len, config.octave_tolerance)
    }

    /// Feeds one raw estimate through smoothing and octave correction.
    ///
    /// An absent estimate passes through untouched and leaves the history
    /// alone; callers should hold the last displayed value.
    pub fn process(&mut self, estimate: Option<f64>) -> Option<f64> {
        let frequency = estimate?;

        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(frequency);

        let mut corrected = self.median();
        if let Some(last) = self.last_stable {
            // Both checks run in sequence on the running value.
            if (2.0 * corrected - last).abs() < self.octave_tolerance {
                debug!("[SMOOTHING] {:.2} Hz looks like a subharmonic, doubling", corrected);
                corrected *= 2.0;
            }
            if (corrected / 2.0 - last).abs() < self.octave_tolerance {
                debug!("[SMOOTHING] {:.2} Hz looks like an overtone, halving", corrected);
                corrected /= 2.0;
            }
        }

        self.last_stable = Some(corrected);
        Some(corrected)
    }

    /// Middle element of the sorted history.
    fn median(&self) -> f64 {
        let mut sorted: Vec<f64> = self.history.iter().copied().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted[sorted.len() / 2]
    }

    pub fn last_stable(&self) -> Option<f64> {
        self.last_stable
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Forgets the history and the last stable value.
    pub fn reset(&mut self) {
        self.history.clear();
        self.last_stable = None;
    }
}
