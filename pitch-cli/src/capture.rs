//! # Audio Capture Module
//!
//! Opens the default input device with CPAL and forwards every callback
//! buffer to the processing loop as little-endian signed 16-bit mono PCM
//! bytes, the format the pitch pipeline consumes.
//!
//! Stream errors travel on a separate single-slot channel so a full chunk
//! queue can never swallow them; the processing loop decides what to do
//! with them.

use anyhow::{Result, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SupportedStreamConfigRange};
use crossbeam_channel::Sender;
use log::{info, warn};

/// Starts audio capture from the default input device.
///
/// # Arguments
/// * `chunks` - Channel sender for streaming s16le PCM chunks to the processing loop
/// * `failures` - Channel sender for the terminal stream error
/// * `target_rate` - Desired sample rate in Hz
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Audio stream handle and the actual sample rate
/// * `Err(e)` - Error if audio setup fails
pub fn start_capture(
    chunks: Sender<Vec<u8>>,
    failures: Sender<String>,
    target_rate: u32,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    info!("[CAPTURE] Using audio input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, target_rate)
        .ok_or_else(|| anyhow!("No suitable i16 or f32 input format found"))?;

    let rate = target_rate.clamp(
        supported_config.min_sample_rate().0,
        supported_config.max_sample_rate().0,
    );
    let channels = supported_config.channels().max(1) as usize;
    let sample_format = supported_config.sample_format();
    let config: cpal::StreamConfig = supported_config.with_sample_rate(cpal::SampleRate(rate)).into();

    info!(
        "[CAPTURE] {} Hz, {} channel(s), {:?}",
        rate, channels, sample_format
    );
    if channels > 1 {
        warn!("[CAPTURE] No mono input available, using the first channel");
    }

    let err_fn = move |err: cpal::StreamError| {
        // The first failure is the one that ends the session.
        if failures.try_send(err.to_string()).is_err() {
            warn!("[CAPTURE] Dropping follow-up stream error: {}", err);
        }
    };

    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                // Dropping a chunk when the loop lags is better than blocking
                // the audio thread.
                let _ = chunks.try_send(encode_i16(data, channels));
            },
            err_fn,
            None,
        )?,
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let _ = chunks.try_send(encode_f32(data, channels));
            },
            err_fn,
            None,
        )?,
        other => return Err(anyhow!("Unsupported sample format {:?}", other)),
    };

    stream.play()?;

    Ok((stream, rate))
}

/// Picks the input configuration closest to what the pipeline wants:
/// 16-bit or float samples, mono if possible, nearest sample rate.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| matches!(c.sample_format(), SampleFormat::I16 | SampleFormat::F32))
        .min_by_key(|c| {
            let rate_miss = if (c.min_sample_rate().0..=c.max_sample_rate().0).contains(&target_rate) {
                0
            } else {
                let min_diff = (c.min_sample_rate().0 as i64 - target_rate as i64).abs();
                let max_diff = (c.max_sample_rate().0 as i64 - target_rate as i64).abs();
                min_diff.min(max_diff)
            };
            (c.channels() != 1, rate_miss)
        })
}

/// Keeps the first channel of each frame and serializes it as s16le.
fn encode_i16(data: &[i16], channels: usize) -> Vec<u8> {
    data.chunks(channels)
        .flat_map(|frame| frame[0].to_le_bytes())
        .collect()
}

/// Converts float samples to s16le, keeping the first channel.
fn encode_f32(data: &[f32], channels: usize) -> Vec<u8> {
    data.chunks(channels)
        .flat_map(|frame| ((frame[0].clamp(-1.0, 1.0) * 32767.0) as i16).to_le_bytes())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_i16_is_passed_through() {
        assert_eq!(encode_i16(&[1, -2], 1), vec![0x01, 0x00, 0xfe, 0xff]);
    }

    #[test]
    fn first_channel_is_kept() {
        assert_eq!(encode_i16(&[7, 100, -1, 100], 2), vec![0x07, 0x00, 0xff, 0xff]);
    }

    #[test]
    fn float_samples_are_scaled_and_clamped() {
        let bytes = encode_f32(&[0.5, 2.0, -2.0], 1);
        let samples: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        assert_eq!(samples, vec![16383, 32767, -32767]);
    }
}
