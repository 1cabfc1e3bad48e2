//! # Sample Decoder Module
//!
//! Converts raw little-endian signed 16-bit PCM bytes, as delivered by the
//! capture collaborator, into normalized floating point samples.

/// Full-scale divisor for signed 16-bit samples.
const I16_SCALE: f64 = 32768.0;

/// Decodes little-endian signed 16-bit PCM bytes into samples in [-1, 1).
///
/// A trailing odd byte is an incomplete sample and is dropped.
pub fn decode_pcm16le(bytes: &[u8]) -> Vec<f64> {
    bytes.chunks_exact(2).map(sample_from_pair).collect()
}

fn sample_from_pair(pair: &[u8]) -> f64 {
    i16::from_le_bytes([pair[0], pair[1]]) as f64 / I16_SCALE
}

/// Stateless decoder for the PCM chunks fed into the pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct SampleDecoder;

impl SampleDecoder {
    /// Decodes `bytes` and appends the samples to `out`.
    ///
    /// Returns the number of samples appended.
    pub fn decode_into(&self, bytes: &[u8], out: &mut Vec<f64>) -> usize {
        let before = out.len();
        out.extend(bytes.chunks_exact(2).map(sample_from_pair));
        out.len() - before
    }
}
