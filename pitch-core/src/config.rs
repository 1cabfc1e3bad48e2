//! # Configuration Module
//!
//! Every tunable constant of the analysis pipeline lives in
//! [`PipelineConfig`]. The struct is serde-friendly so a partial JSON file
//! can override just the fields it names; everything else keeps its
//! default.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::PitchError;
use crate::pitch::EstimatorKind;

/// Tunable parameters of the pitch pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Sample rate of the incoming PCM stream in Hz.
    pub sample_rate: u32,
    /// Number of samples analysed per pass.
    pub frame_size: usize,
    /// Samples retained after each analysis pass.
    pub overlap: usize,
    /// Hard ceiling on buffered samples.
    pub trim_ceiling: usize,
    /// Frames shorter than this never produce an estimate.
    pub min_frame_len: usize,
    /// Frames with an RMS below this floor are treated as silence.
    pub silence_rms: f64,
    /// Cumulative mean normalized difference threshold for YIN.
    pub yin_threshold: f64,
    /// Lowest frequency that is mapped to a note.
    pub min_frequency: f64,
    /// Highest frequency that is mapped to a note.
    pub max_frequency: f64,
    /// Number of raw estimates kept for median smoothing. Must be odd.
    pub history_len: usize,
    /// Octave correction tolerance in Hz.
    pub octave_tolerance: f64,
    /// A note within this many cents of its semitone counts as in tune.
    pub in_tune_cents: f64,
    /// Jumps larger than this are unwrapped by a full octave.
    pub unwrap_threshold_cents: f64,
    /// Reference pitch for A4 in Hz.
    pub reference_a4: f64,
    /// Which period estimator to run.
    pub estimator: EstimatorKind,
    /// Autocorrelation search range, low end in Hz.
    pub autocorr_min_frequency: f64,
    /// Autocorrelation search range, high end in Hz.
    pub autocorr_max_frequency: f64,
    /// Minimum normalized correlation for an autocorrelation peak.
    pub autocorr_confidence: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            frame_size: 4096,
            overlap: 2048,
            trim_ceiling: 8192,
            min_frame_len: 2048,
            silence_rms: 0.01,
            yin_threshold: 0.1,
            min_frequency: 20.0,
            max_frequency: 4200.0,
            history_len: 5,
            octave_tolerance: 5.0,
            in_tune_cents: 10.0,
            unwrap_threshold_cents: 600.0,
            reference_a4: 440.0,
            estimator: EstimatorKind::Yin,
            autocorr_min_frequency: 70.0,
            autocorr_max_frequency: 1000.0,
            autocorr_confidence: 0.5,
        }
    }
}

impl PipelineConfig {
    /// Loads a configuration from a JSON file and validates it.
    ///
    /// Fields missing from the file take their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PitchError> {
        let data = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, PitchError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks that the parameters are mutually consistent.
    pub fn validate(&self) -> Result<(), PitchError> {
        let invalid = |msg: String| Err(PitchError::InvalidConfig(msg));

        if self.sample_rate == 0 {
            return invalid("sample_rate must be greater than 0".into());
        }
        if self.min_frame_len < 2 {
            return invalid("min_frame_len must be at least 2".into());
        }
        if self.frame_size < self.min_frame_len {
            return invalid(format!(
                "frame_size {} is below min_frame_len {}",
                self.frame_size, self.min_frame_len
            ));
        }
        if self.overlap >= self.frame_size {
            return invalid(format!(
                "overlap {} must be smaller than frame_size {}",
                self.overlap, self.frame_size
            ));
        }
        if self.frame_size > self.trim_ceiling {
            return invalid(format!(
                "frame_size {} exceeds trim_ceiling {}",
                self.frame_size, self.trim_ceiling
            ));
        }
        if self.history_len == 0 || self.history_len % 2 == 0 {
            return invalid(format!(
                "history_len must be odd and non-zero, got {}",
                self.history_len
            ));
        }
        if !(self.yin_threshold > 0.0 && self.yin_threshold < 1.0) {
            return invalid(format!(
                "yin_threshold must be in (0, 1), got {}",
                self.yin_threshold
            ));
        }
        if !(self.min_frequency > 0.0 && self.min_frequency < self.max_frequency) {
            return invalid(format!(
                "frequency range {}..{} is empty",
                self.min_frequency, self.max_frequency
            ));
        }
        if !(self.autocorr_min_frequency > 0.0
            && self.autocorr_min_frequency < self.autocorr_max_frequency)
        {
            return invalid(format!(
                "autocorrelation range {}..{} is empty",
                self.autocorr_min_frequency, self.autocorr_max_frequency
            ));
        }
        if self.reference_a4 <= 0.0 {
            return invalid("reference_a4 must be positive".into());
        }
        if self.silence_rms < 0.0
            || self.octave_tolerance < 0.0
            || self.in_tune_cents < 0.0
            || self.unwrap_threshold_cents <= 0.0
        {
            return invalid("tolerances must not be negative".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.frame_size, 4096);
        assert_eq!(config.overlap, 2048);
        assert_eq!(config.trim_ceiling, 8192);
        assert_eq!(config.history_len, 5);
        assert_eq!(config.estimator, EstimatorKind::Yin);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "sample_rate": 48000, "estimator": "autocorrelation" }"#)
                .unwrap();
        assert_eq!(config.sample_rate, 48_000);
        assert_eq!(config.estimator, EstimatorKind::Autocorrelation);
        assert_eq!(config.frame_size, 4096);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_even_history() {
        let config = PipelineConfig {
            history_len: 4,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PitchError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_overlap_not_below_frame() {
        let config = PipelineConfig {
            overlap: 4096,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_frame_above_ceiling() {
        let config = PipelineConfig {
            frame_size: 16384,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!(
            "pitch-core-config-{}.json",
            std::process::id()
        ));
        let config = PipelineConfig {
            yin_threshold: 0.15,
            ..Default::default()
        };
        std::fs::write(&path, config.to_json().unwrap()).unwrap();
        let loaded = PipelineConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = PipelineConfig::from_json_file("/nonexistent/pitch.json").unwrap_err();
        assert!(matches!(err, PitchError::Io(_)));
    }
}
