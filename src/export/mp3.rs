//! Compressed-audio export via a block encoder.
//!
//! MP3 encoders consume fixed-size frames in order and may hold output back
//! until later frames or the final flush, so every call can return zero or
//! more bytes.

use crate::audio::AudioFormat;
use crate::defaults;
use crate::error::{Result, SpkError};
use mp3lame_encoder::{
    Bitrate, Builder, Encoder, FlushNoGap, InterleavedPcm, MonoPcm, Quality,
    max_required_buffer_size,
};

/// Trait for stateful block encoders.
pub trait BlockEncoder: Send {
    /// Encode one frame of interleaved samples.
    fn encode_frame(&mut self, samples: &[i16]) -> Result<Vec<u8>>;

    /// Emit whatever the encoder still buffers. Called exactly once, last.
    fn flush(&mut self) -> Result<Vec<u8>>;
}

/// Drive `encoder` across `samples` in [`defaults::MP3_FRAME_SAMPLES`] frames,
/// then flush, concatenating all non-empty output in emission order.
pub fn encode_blocks(encoder: &mut dyn BlockEncoder, samples: &[i16]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut frames = 0usize;

    for frame in samples.chunks(defaults::MP3_FRAME_SAMPLES) {
        let bytes = encoder.encode_frame(frame)?;
        if !bytes.is_empty() {
            out.extend_from_slice(&bytes);
        }
        frames += 1;
    }

    let tail = encoder.flush()?;
    if !tail.is_empty() {
        out.extend_from_slice(&tail);
    }

    tracing::debug!(frames, bytes = out.len(), "block encoding finished");
    Ok(out)
}

/// Block encoder backed by libmp3lame.
///
/// Mono input goes through LAME's mono path and stereo input is passed
/// interleaved. Other channel counts are rejected up front.
pub struct LameEncoder {
    encoder: Encoder,
    channels: u16,
}

impl LameEncoder {
    /// Configure LAME for the given format and bitrate (kbit/s).
    pub fn new(format: AudioFormat, bitrate_kbps: u32) -> Result<Self> {
        let bitrate = lame_bitrate(bitrate_kbps)
            .ok_or_else(|| SpkError::encode(format!("unsupported MP3 bitrate {}", bitrate_kbps)))?;
        let channels = match format.channels {
            1 => 1u8,
            2 => 2u8,
            n => return Err(SpkError::encode(format!("MP3 cannot carry {} channels", n))),
        };

        let mut builder =
            Builder::new().ok_or_else(|| SpkError::encode("LAME could not allocate an encoder"))?;
        builder.set_num_channels(channels).map_err(build_error)?;
        builder
            .set_sample_rate(format.sample_rate)
            .map_err(build_error)?;
        builder.set_brate(bitrate).map_err(build_error)?;
        builder.set_quality(Quality::Good).map_err(build_error)?;
        let encoder = builder.build().map_err(build_error)?;

        tracing::debug!(%format, bitrate_kbps, "LAME encoder ready");
        Ok(Self {
            encoder,
            channels: format.channels,
        })
    }
}

impl BlockEncoder for LameEncoder {
    fn encode_frame(&mut self, samples: &[i16]) -> Result<Vec<u8>> {
        let per_channel = samples.len() / usize::from(self.channels.max(1));
        let mut out = Vec::with_capacity(max_required_buffer_size(per_channel));
        let encoded = if self.channels == 1 {
            self.encoder.encode_to_vec(MonoPcm(samples), &mut out)
        } else {
            self.encoder.encode_to_vec(InterleavedPcm(samples), &mut out)
        };
        encoded.map_err(|e| SpkError::encode(format!("LAME: {}", e)))?;
        Ok(out)
    }

    fn flush(&mut self) -> Result<Vec<u8>> {
        // lame_encode_flush wants at least 7200 bytes of room
        let mut out = Vec::with_capacity(7200);
        self.encoder
            .flush_to_vec::<FlushNoGap>(&mut out)
            .map_err(|e| SpkError::encode(format!("LAME flush: {}", e)))?;
        Ok(out)
    }
}

fn build_error(err: mp3lame_encoder::BuildError) -> SpkError {
    SpkError::encode(format!("LAME setup: {}", err))
}

/// LAME's constant-bitrate steps, in kbit/s.
pub fn lame_bitrate(kbps: u32) -> Option<Bitrate> {
    Some(match kbps {
        8 => Bitrate::Kbps8,
        16 => Bitrate::Kbps16,
        24 => Bitrate::Kbps24,
        32 => Bitrate::Kbps32,
        40 => Bitrate::Kbps40,
        48 => Bitrate::Kbps48,
        64 => Bitrate::Kbps64,
        80 => Bitrate::Kbps80,
        96 => Bitrate::Kbps96,
        112 => Bitrate::Kbps112,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        224 => Bitrate::Kbps224,
        256 => Bitrate::Kbps256,
        320 => Bitrate::Kbps320,
        _ => return None,
    })
}
