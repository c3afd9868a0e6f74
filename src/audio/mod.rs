//! PCM buffers, the WAV container codec, and sample-level helpers.

pub mod trim;
pub mod wav;

pub use trim::trim_silence;
pub use wav::{ParsedWav, encode_wav, parse_wav};

use crate::defaults;
use std::fmt;

/// Channel layout and rate of an interleaved 16-bit sample buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub channels: u16,
    pub sample_rate: u32,
}

impl AudioFormat {
    pub fn new(channels: u16, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
        }
    }

    /// Interleaved samples per second.
    pub fn samples_per_second(&self) -> u64 {
        self.sample_rate as u64 * self.channels as u64
    }

    /// Number of interleaved samples covering `duration_ms`.
    ///
    /// `floor(duration_ms / 1000 * sample_rate * channels)`, saturating.
    pub fn samples_for_ms(&self, duration_ms: u64) -> u64 {
        let total = duration_ms as u128 * self.samples_per_second() as u128 / 1000;
        u64::try_from(total).unwrap_or(u64::MAX)
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::new(defaults::CHANNELS, defaults::SAMPLE_RATE)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = match self.channels {
            1 => "mono".to_string(),
            2 => "stereo".to_string(),
            n => format!("{n}ch"),
        };
        write!(f, "{}Hz {}", self.sample_rate, layout)
    }
}

/// A decoded, interleaved 16-bit PCM track.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PcmAudio {
    pub format: AudioFormat,
    pub samples: Vec<i16>,
}

impl PcmAudio {
    pub fn new(format: AudioFormat, samples: Vec<i16>) -> Self {
        Self { format, samples }
    }

    /// Samples per channel.
    pub fn frames(&self) -> usize {
        self.samples.len() / self.format.channels.max(1) as usize
    }

    pub fn duration_secs(&self) -> f64 {
        let per_second = self.format.samples_per_second();
        if per_second == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / per_second as f64
    }

    /// Normalize to the `[-1.0, 1.0)` float range used by audio encoders.
    pub fn to_f32(&self) -> Vec<f32> {
        self.samples.iter().map(|&s| s as f32 / 32768.0).collect()
    }
}

/// Convert interleaved samples between channel layouts.
///
/// Downmixing to mono averages every frame; any other change maps output
/// channel `c` to input channel `c % from`.
pub fn remix(samples: &[i16], from: u16, to: u16) -> Vec<i16> {
    if from == to || from == 0 || to == 0 {
        return samples.to_vec();
    }
    let from = from as usize;
    let to = to as usize;

    samples
        .chunks_exact(from)
        .flat_map(|frame| {
            let mono = (frame.iter().map(|&s| s as i32).sum::<i32>() / from as i32) as i16;
            (0..to).map(move |c| if to == 1 { mono } else { frame[c % from] })
        })
        .collect()
}

/// Linear interpolation resampling of interleaved audio.
pub fn resample(samples: &[i16], channels: u16, from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || from_rate == 0 || to_rate == 0 || samples.is_empty() {
        return samples.to_vec();
    }
    let channels = channels.max(1) as usize;
    let frames = samples.len() / channels;
    if frames == 0 {
        return Vec::new();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_frames = (frames as f64 / ratio).ceil() as usize;
    let mut out = Vec::with_capacity(output_frames * channels);

    for i in 0..output_frames {
        let source_pos = i as f64 * ratio;
        let source_idx = (source_pos.floor() as usize).min(frames - 1);
        let fraction = source_pos - source_idx as f64;

        for c in 0..channels {
            let left = samples[source_idx * channels + c];
            let value = if source_idx + 1 >= frames {
                left
            } else {
                let left = left as f64;
                let right = samples[(source_idx + 1) * channels + c] as f64;
                (left + (right - left) * fraction) as i16
            };
            out.push(value);
        }
    }
    out
}
