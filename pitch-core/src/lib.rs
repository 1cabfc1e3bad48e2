// pitch-core/src/lib.rs

//! The core logic for the monophonic pitch tracker.
//! This crate turns a live stream of 16-bit PCM into a smoothed
//! fundamental frequency, the nearest equal-tempered note, and an
//! unwrapped pointer position for a scrolling note-scale display. It is
//! completely headless and contains no capture or rendering code.
//!
//! ```
//! use pitch_core::{PipelineConfig, PitchPipeline};
//!
//! let mut pipeline = PitchPipeline::new(PipelineConfig::default()).unwrap();
//! pipeline.start();
//! let chunk = vec![0u8; 2048];
//! // Silence never produces a pitch.
//! assert!(pipeline.process_chunk(&chunk).is_none());
//! ```

pub mod buffer;
pub mod config;
pub mod decoder;
pub mod error;
pub mod fft;
pub mod indicator;
pub mod pipeline;
pub mod pitch;
pub mod smoothing;
pub mod tuning;
pub mod window;

pub use config::PipelineConfig;
pub use error::PitchError;
pub use indicator::{IndicatorUpdate, TuningIndicator};
pub use pipeline::{ListeningStopped, PitchPipeline, PitchResult};
pub use pitch::{AutocorrelationEstimator, EstimatorKind, PitchEstimator, YinEstimator};
pub use tuning::NoteInfo;
