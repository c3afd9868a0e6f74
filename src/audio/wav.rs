//! RIFF/WAVE container codec.
//!
//! Parsing reads the format fields at their fixed offsets and locates the
//! sample payload with a small chunk scanner. Encoding always produces the
//! canonical 44-byte header with 16-bit PCM.

use crate::audio::{AudioFormat, PcmAudio};
use crate::error::{Result, SpkError};

/// Big-endian "data".
const DATA_TAG: u32 = 0x6461_7461;

/// Chunk scanning starts right after "RIFF", the size field, and "WAVE".
const FIRST_CHUNK_OFFSET: usize = 12;

/// Tag plus length.
const CHUNK_HEADER_LEN: usize = 8;

const CHANNELS_OFFSET: usize = 22;
const SAMPLE_RATE_OFFSET: usize = 24;
const BITS_PER_SAMPLE_OFFSET: usize = 34;

/// Size of the header written by [`encode_wav`].
pub const HEADER_LEN: usize = 44;

/// Decoded contents of a WAV container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedWav {
    pub format: AudioFormat,
    /// Bit depth of the source payload; samples are always widened to 16 bits.
    pub bits_per_sample: u16,
    pub samples: Vec<i16>,
}

impl ParsedWav {
    pub fn into_pcm(self) -> PcmAudio {
        PcmAudio::new(self.format, self.samples)
    }
}

/// Outcome of one scanner step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanStep {
    /// A non-data chunk was skipped; the cursor now points past it.
    Skipped { tag: [u8; 4], len: u32 },
    /// The data chunk header was found; the payload starts at this offset.
    Data { payload_start: usize },
    /// The cursor ran past the end of the buffer without finding data.
    Overrun { offset: usize },
}

/// Walks tagged chunks from [`FIRST_CHUNK_OFFSET`] until the data chunk.
struct ChunkScanner<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> ChunkScanner<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            cursor: FIRST_CHUNK_OFFSET,
        }
    }

    fn step(&mut self) -> ScanStep {
        let header_end = self.cursor.saturating_add(CHUNK_HEADER_LEN);
        let Some(header) = self.bytes.get(self.cursor..header_end) else {
            return ScanStep::Overrun {
                offset: self.cursor,
            };
        };

        let tag = [header[0], header[1], header[2], header[3]];
        let len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        if u32::from_be_bytes(tag) == DATA_TAG {
            return ScanStep::Data {
                payload_start: header_end,
            };
        }

        self.cursor = header_end.saturating_add(len as usize);
        ScanStep::Skipped { tag, len }
    }

    /// Run the scanner to completion.
    fn find_payload(mut self) -> Result<usize> {
        loop {
            match self.step() {
                ScanStep::Skipped { tag, len } => {
                    tracing::trace!(
                        tag = %String::from_utf8_lossy(&tag),
                        len,
                        "skipping WAV chunk"
                    );
                }
                ScanStep::Data { payload_start } => return Ok(payload_start),
                ScanStep::Overrun { offset } => {
                    return Err(SpkError::malformed(format!(
                        "data chunk not found (scan overran buffer at offset {} of {})",
                        offset,
                        self.bytes.len()
                    )));
                }
            }
        }
    }
}

fn read_u16_le(bytes: &[u8], offset: usize) -> Option<u16> {
    let b = bytes.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32_le(bytes: &[u8], offset: usize) -> Option<u32> {
    let b = bytes.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Decode a WAV container produced by the synthesizer.
///
/// The payload is taken to run to the end of the buffer; the declared data
/// length is not trusted. 8-bit payloads are re-centred and widened to 16 bits.
pub fn parse_wav(bytes: &[u8]) -> Result<ParsedWav> {
    let too_short = || SpkError::malformed(format!("header truncated ({} bytes)", bytes.len()));
    let channels = read_u16_le(bytes, CHANNELS_OFFSET).ok_or_else(too_short)?;
    let sample_rate = read_u32_le(bytes, SAMPLE_RATE_OFFSET).ok_or_else(too_short)?;
    let bits_per_sample = read_u16_le(bytes, BITS_PER_SAMPLE_OFFSET).ok_or_else(too_short)?;

    if channels == 0 {
        return Err(SpkError::malformed("channel count is zero"));
    }
    if sample_rate == 0 {
        return Err(SpkError::malformed("sample rate is zero"));
    }

    let payload = &bytes[ChunkScanner::new(bytes).find_payload()?..];

    let samples = match bits_per_sample {
        8 => payload.iter().map(|&b| (b as i16 - 128) << 8).collect(),
        16 => payload
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect(),
        other => {
            return Err(SpkError::malformed(format!(
                "unsupported bit depth {}",
                other
            )));
        }
    };

    Ok(ParsedWav {
        format: AudioFormat::new(channels, sample_rate),
        bits_per_sample,
        samples,
    })
}

/// Wrap interleaved 16-bit samples in a canonical WAV container.
pub fn encode_wav(samples: &[i16], format: AudioFormat) -> Vec<u8> {
    let data_len = u32::try_from(samples.len() * 2).unwrap_or(u32::MAX);
    let block_align = format.channels.saturating_mul(2);
    let byte_rate = format.sample_rate.saturating_mul(block_align as u32);

    let mut out = Vec::with_capacity(HEADER_LEN + samples.len() * 2);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&data_len.saturating_add(36).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&format.channels.to_le_bytes());
    out.extend_from_slice(&format.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}
