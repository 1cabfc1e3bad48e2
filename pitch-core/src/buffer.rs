//! # Sample Buffer Module
//!
//! Accumulates decoded samples across chunk boundaries until a full
//! analysis frame is available. Analysis always runs on the freshest
//! samples, and only a short overlap tail survives each pass.

/// Growable sample store with front truncation.
#[derive(Debug, Clone, Default)]
pub struct SampleBuffer {
    samples: Vec<f64>,
}

impl SampleBuffer {
    /// Creates an empty buffer with room for `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Extends the buffer with newly decoded samples.
    pub fn append(&mut self, samples: &[f64]) {
        self.samples.extend_from_slice(samples);
    }

    /// Direct access for decoders that write in place.
    pub(crate) fn samples_mut(&mut self) -> &mut Vec<f64> {
        &mut self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// True once at least `window_size` samples are buffered.
    pub fn is_ready(&self, window_size: usize) -> bool {
        self.samples.len() >= window_size
    }

    /// Copies the most recent `window_size` samples into a new frame.
    ///
    /// Returns `None` if fewer samples are buffered.
    pub fn extract_window(&self, window_size: usize) -> Option<Vec<f64>> {
        if !self.is_ready(window_size) {
            return None;
        }
        let start = self.samples.len() - window_size;
        Some(self.samples[start..].to_vec())
    }

    /// If the buffer holds more than `max_len` samples, discards all but the
    /// last `keep_tail`.
    pub fn trim(&mut self, max_len: usize, keep_tail: usize) {
        if self.samples.len() > max_len {
            self.retain_tail(keep_tail);
        }
    }

    /// Keeps only the last `keep_tail` samples.
    pub fn retain_tail(&mut self, keep_tail: usize) {
        let len = self.samples.len();
        if len > keep_tail {
            self.samples.drain(..len - keep_tail);
        }
    }

    /// Clears all buffered samples.
    pub fn reset(&mut self) {
        self.samples.clear();
    }
}
