//! # Pipeline Module
//!
//! [`PitchPipeline`] owns every piece of streaming state: the sample
//! buffer, the smoothing history, the last stable frequency and the
//! indicator position. Each PCM chunk handed to
//! [`PitchPipeline::process_chunk`] runs one synchronous
//! decode, buffer, analyze, smooth and map pass.
//!
//! Nothing in here blocks. The YIN difference function is `O(n^2)` in the
//! frame length, and a pass completes before `process_chunk` returns.

use std::fmt;

use log::{debug, info, warn};
use serde::Serialize;

use crate::buffer::SampleBuffer;
use crate::config::PipelineConfig;
use crate::decoder::SampleDecoder;
use crate::error::PitchError;
use crate::indicator::{IndicatorUpdate, TuningIndicator};
use crate::pitch::PitchEstimator;
use crate::smoothing::PitchPostProcessor;
use crate::tuning::{cents_from_a4, note_from_cents, NoteInfo};
use crate::window::apply_hann_window;

/// Output of one successful analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PitchResult {
    /// Smoothed, octave-corrected frequency in Hz.
    pub frequency: f64,
    /// The nearest note, absent when the frequency is outside the musical
    /// range.
    pub note: Option<NoteInfo>,
    /// Whether `note` is within the in-tune tolerance.
    pub in_tune: bool,
    /// Pointer animation for the scrolling note scale, absent together
    /// with `note`.
    pub indicator: Option<IndicatorUpdate>,
}

/// Terminal signal emitted when the capture stream fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListeningStopped {
    pub reason: String,
}

impl fmt::Display for ListeningStopped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listening stopped: {}", self.reason)
    }
}

/// Streaming pitch tracker.
pub struct PitchPipeline {
    config: PipelineConfig,
    decoder: SampleDecoder,
    buffer: SampleBuffer,
    estimator: Box<dyn PitchEstimator>,
    post: PitchPostProcessor,
    indicator: TuningIndicator,
    listening: bool,
}

impl PitchPipeline {
    /// Builds an idle pipeline running the estimator named in `config`.
    pub fn new(config: PipelineConfig) -> Result<Self, PitchError> {
        let estimator = config.estimator.build(&config);
        Self::with_estimator(config, estimator)
    }

    /// Builds an idle pipeline around a caller-supplied estimator.
    pub fn with_estimator(
        config: PipelineConfig,
        estimator: Box<dyn PitchEstimator>,
    ) -> Result<Self, PitchError> {
        config.validate()?;
        debug!(
            "[PIPELINE] frame {} overlap {} at {} Hz using {}",
            config.frame_size,
            config.overlap,
            config.sample_rate,
            estimator.name()
        );
        Ok(Self {
            decoder: SampleDecoder,
            buffer: SampleBuffer::with_capacity(config.trim_ceiling),
            estimator,
            post: PitchPostProcessor::from_config(&config),
            indicator: TuningIndicator::new(config.unwrap_threshold_cents),
            listening: false,
            config,
        })
    }

    /// Begins accepting chunks. Buffered state always starts empty.
    pub fn start(&mut self) {
        if self.listening {
            return;
        }
        self.buffer.reset();
        self.post.reset();
        self.listening = true;
        info!("[PIPELINE] listening");
    }

    /// Stops accepting chunks and drops all buffered and smoothing state.
    ///
    /// The indicator keeps its last position so a display can hold it.
    pub fn stop(&mut self) {
        self.listening = false;
        self.buffer.reset();
        self.post.reset();
        info!("[PIPELINE] stopped");
    }

    /// Handles a failure reported by the capture stream.
    ///
    /// The pipeline stops and resets. It never restarts on its own.
    pub fn handle_capture_error(&mut self, error: impl fmt::Display) -> ListeningStopped {
        let reason = error.to_string();
        warn!("[PIPELINE] capture failed: {}", reason);
        self.stop();
        ListeningStopped { reason }
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Decodes one PCM chunk and runs an analysis pass if a full frame is
    /// buffered.
    ///
    /// Returns `None` when nothing new should be displayed: the pipeline is
    /// stopped, the frame is not full yet, or no reliable pitch was found.
    pub fn process_chunk(&mut self, bytes: &[u8]) -> Option<PitchResult> {
        if !self.listening {
            return None;
        }
        self.decoder.decode_into(bytes, self.buffer.samples_mut());

        let result = if self.buffer.is_ready(self.config.frame_size) {
            self.analyze()
        } else {
            None
        };
        self.buffer.trim(self.config.trim_ceiling, self.config.overlap);
        result
    }

    fn analyze(&mut self) -> Option<PitchResult> {
        let mut frame = self.buffer.extract_window(self.config.frame_size)?;
        // The next pass starts from the overlap tail.
        self.buffer.retain_tail(self.config.overlap);

        apply_hann_window(&mut frame);
        let raw = self.estimator.estimate(&frame, self.config.sample_rate);
        let frequency = self.post.process(raw)?;

        if frequency < self.config.min_frequency || frequency > self.config.max_frequency {
            debug!(
                "[PIPELINE] {:.2} Hz is outside {}..{} Hz, note not updated",
                frequency, self.config.min_frequency, self.config.max_frequency
            );
            return Some(PitchResult {
                frequency,
                note: None,
                in_tune: false,
                indicator: None,
            });
        }

        let cents = cents_from_a4(frequency, self.config.reference_a4);
        let note = note_from_cents(cents);
        let indicator = self.indicator.update(cents);
        debug!("[PIPELINE] {:.2} Hz -> {}", frequency, note);

        Some(PitchResult {
            frequency,
            in_tune: note.is_in_tune(self.config.in_tune_cents),
            note: Some(note),
            indicator: Some(indicator),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn estimator_name(&self) -> &'static str {
        self.estimator.name()
    }

    /// Number of samples currently buffered.
    pub fn buffered_samples(&self) -> usize {
        self.buffer.len()
    }

    pub fn indicator(&self) -> &TuningIndicator {
        &self.indicator
    }

    /// Mutable access for the animation collaborator's write-back.
    pub fn indicator_mut(&mut self) -> &mut TuningIndicator {
        &mut self.indicator
    }

    pub fn last_stable_frequency(&self) -> Option<f64> {
        self.post.last_stable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::EstimatorKind;
    use std::f64::consts::PI;

    fn sine_bytes(frequency: f64, samples: usize) -> Vec<u8> {
        (0..samples)
            .flat_map(|i| {
                let value = 0.5 * (2.0 * PI * frequency * i as f64 / 44_100.0).sin();
                ((value * 32767.0) as i16).to_le_bytes()
            })
            .collect()
    }

    fn listening_pipeline() -> PitchPipeline {
        let mut pipeline = PitchPipeline::new(PipelineConfig::default()).unwrap();
        pipeline.start();
        pipeline
    }

    /// Always reports the same frequency, to test the plumbing around the
    /// estimator.
    struct FixedEstimator(Option<f64>);

    impl PitchEstimator for FixedEstimator {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn estimate(&mut self, _frame: &[f64], _sample_rate: u32) -> Option<f64> {
            self.0
        }
    }

    fn fixed_pipeline(frequency: Option<f64>) -> PitchPipeline {
        let mut pipeline = PitchPipeline::with_estimator(
            PipelineConfig::default(),
            Box::new(FixedEstimator(frequency)),
        )
        .unwrap();
        pipeline.start();
        pipeline
    }

    #[test]
    fn idle_pipeline_ignores_chunks() {
        let mut pipeline = PitchPipeline::new(PipelineConfig::default()).unwrap();
        assert!(!pipeline.is_listening());
        assert_eq!(pipeline.process_chunk(&sine_bytes(440.0, 8192)), None);
        assert_eq!(pipeline.buffered_samples(), 0);
    }

    #[test]
    fn waits_for_a_full_frame() {
        let mut pipeline = fixed_pipeline(Some(440.0));
        assert_eq!(pipeline.process_chunk(&sine_bytes(440.0, 4095)), None);
        assert_eq!(pipeline.buffered_samples(), 4095);
        let result = pipeline.process_chunk(&sine_bytes(440.0, 1)).unwrap();
        assert_eq!(result.frequency, 440.0);
        assert_eq!(pipeline.buffered_samples(), 2048);
    }

    #[test]
    fn detects_a4_end_to_end() {
        let mut pipeline = listening_pipeline();
        let result = pipeline.process_chunk(&sine_bytes(440.0, 4096)).unwrap();
        assert!((result.frequency - 440.0).abs() < 4.4);
        let note = result.note.unwrap();
        assert_eq!((note.name, note.octave), ("A", 4));
        assert!(result.in_tune);
        let indicator = result.indicator.unwrap();
        assert_eq!(indicator.start_cents, indicator.target_cents);
    }

    #[test]
    fn silence_emits_nothing() {
        let mut pipeline = listening_pipeline();
        assert_eq!(pipeline.process_chunk(&vec![0u8; 8192 * 2]), None);
        assert_eq!(pipeline.last_stable_frequency(), None);
    }

    #[test]
    fn out_of_range_frequency_skips_note() {
        let mut pipeline = fixed_pipeline(Some(5000.0));
        let result = pipeline.process_chunk(&sine_bytes(440.0, 4096)).unwrap();
        assert_eq!(result.frequency, 5000.0);
        assert_eq!(result.note, None);
        assert_eq!(result.indicator, None);
        assert!(!result.in_tune);
        assert_eq!(pipeline.indicator().current_cents(), None);
    }

    #[test]
    fn stop_resets_and_freezes_indicator() {
        let mut pipeline = fixed_pipeline(Some(440.0));
        pipeline.process_chunk(&sine_bytes(440.0, 4096)).unwrap();
        pipeline.process_chunk(&sine_bytes(440.0, 1000));
        assert!(pipeline.buffered_samples() > 0);

        pipeline.stop();
        assert_eq!(pipeline.buffered_samples(), 0);
        assert_eq!(pipeline.last_stable_frequency(), None);
        assert_eq!(pipeline.indicator().current_cents(), Some(0.0));
        assert_eq!(pipeline.process_chunk(&sine_bytes(440.0, 4096)), None);

        pipeline.start();
        assert_eq!(pipeline.process_chunk(&sine_bytes(440.0, 4095)), None);
    }

    #[test]
    fn capture_error_stops_pipeline() {
        let mut pipeline = fixed_pipeline(Some(440.0));
        pipeline.process_chunk(&sine_bytes(440.0, 3000));
        let stopped = pipeline.handle_capture_error("device unplugged");
        assert_eq!(stopped.reason, "device unplugged");
        assert_eq!(stopped.to_string(), "listening stopped: device unplugged");
        assert!(!pipeline.is_listening());
        assert_eq!(pipeline.buffered_samples(), 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PipelineConfig {
            frame_size: 1024,
            ..Default::default()
        };
        assert!(matches!(
            PitchPipeline::new(config),
            Err(PitchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn autocorrelation_strategy_is_selectable() {
        let config = PipelineConfig {
            estimator: EstimatorKind::Autocorrelation,
            ..Default::default()
        };
        let mut pipeline = PitchPipeline::new(config).unwrap();
        assert_eq!(pipeline.estimator_name(), "autocorrelation");
        pipeline.start();
        let result = pipeline.process_chunk(&sine_bytes(220.0, 4096)).unwrap();
        assert!((result.frequency - 220.0).abs() < 2.2);
    }
}
