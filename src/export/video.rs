//! Still-image video export.
//!
//! The stitched track is encoded once, the still image is encoded as a single
//! H.264 keyframe, and that keyframe is repeated at a fixed frame rate for the
//! whole duration of the audio before everything goes to the muxer.

use crate::audio::PcmAudio;
use crate::defaults;
use crate::error::{Result, SpkError};
use std::sync::Arc;

/// One candidate configuration for the audio track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioCodecConfig {
    pub codec: String,
    pub channels: u16,
    pub sample_rate: u32,
    pub bitrate: u32,
}

impl AudioCodecConfig {
    /// Codec name as the muxer knows it.
    pub fn mux_codec(&self) -> &'static str {
        if self.codec == "opus" { "opus" } else { "aac" }
    }
}

/// Audio configurations in order of preference: AAC-LC, then Opus.
pub fn audio_codec_candidates(channels: u16, sample_rate: u32) -> Vec<AudioCodecConfig> {
    ["mp4a.40.2", "opus"]
        .into_iter()
        .map(|codec| AudioCodecConfig {
            codec: codec.to_string(),
            channels,
            sample_rate,
            bitrate: defaults::AUDIO_BITRATE,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCodecConfig {
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub bitrate: u32,
    pub framerate: u32,
}

/// Planar-free float PCM handed to the audio encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioData {
    pub sample_rate: u32,
    pub channels: u16,
    pub frames: usize,
    pub timestamp_us: i64,
    /// Interleaved samples in `[-1.0, 1.0)`.
    pub data: Vec<f32>,
}

/// Decoded RGBA picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub timestamp_us: i64,
    pub rgba: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Key,
    Delta,
}

/// Encoded audio or video access unit. The payload is shared so a keyframe
/// can be repeated without copying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedChunk {
    pub kind: ChunkKind,
    pub timestamp_us: i64,
    pub duration_us: Option<i64>,
    pub data: Arc<[u8]>,
}

/// Track layout the muxer is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuxTracks {
    pub video_codec: &'static str,
    pub width: u32,
    pub height: u32,
    pub audio_codec: &'static str,
    pub channels: u16,
    pub sample_rate: u32,
}

#[async_trait::async_trait]
pub trait AudioEncoder: Send + Sync {
    /// Probe whether a configuration can be used. Errors count as "no".
    async fn is_config_supported(&self, config: &AudioCodecConfig) -> Result<bool>;

    async fn configure(&mut self, config: &AudioCodecConfig) -> Result<()>;

    async fn encode(&mut self, data: AudioData) -> Result<Vec<EncodedChunk>>;

    async fn flush(&mut self) -> Result<Vec<EncodedChunk>>;
}

#[async_trait::async_trait]
pub trait VideoEncoder: Send + Sync {
    async fn configure(&mut self, config: &VideoCodecConfig) -> Result<()>;

    async fn encode(&mut self, frame: &VideoFrame, key_frame: bool) -> Result<Vec<EncodedChunk>>;

    async fn flush(&mut self) -> Result<Vec<EncodedChunk>>;
}

/// Container writer; chunks must arrive in timestamp order.
pub trait Muxer: Send {
    fn add_audio_chunk(&mut self, chunk: EncodedChunk) -> Result<()>;

    fn add_video_chunk(&mut self, chunk: EncodedChunk) -> Result<()>;

    /// Finish the container and return its bytes.
    fn finalize(self: Box<Self>) -> Result<Vec<u8>>;
}

pub trait MuxerFactory: Send + Sync {
    fn create(&self, tracks: &MuxTracks) -> Result<Box<dyn Muxer>>;
}

/// External codec collaborators for one video export.
pub struct VideoBackend<'a> {
    pub audio: &'a mut dyn AudioEncoder,
    pub video: &'a mut dyn VideoEncoder,
    pub muxer: &'a dyn MuxerFactory,
}

/// Pick the first candidate the encoder accepts.
pub async fn select_audio_config(
    encoder: &dyn AudioEncoder,
    channels: u16,
    sample_rate: u32,
) -> Result<AudioCodecConfig> {
    for config in audio_codec_candidates(channels, sample_rate) {
        match encoder.is_config_supported(&config).await {
            Ok(true) => return Ok(config),
            Ok(false) => tracing::debug!(codec = %config.codec, "audio codec unsupported"),
            Err(e) => tracing::debug!(codec = %config.codec, error = %e, "audio codec probe failed"),
        }
    }
    Err(SpkError::NoSupportedCodec)
}

/// Scale `width`×`height` so the longest edge is at most `max_edge`, then
/// round both down to even numbers as H.264 requires.
pub fn fit_even_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let longest = width.max(height);
    let (w, h) = if longest > max_edge {
        let scale = |v: u32| (v as u64 * max_edge as u64 / longest as u64) as u32;
        (scale(width), scale(height))
    } else {
        (width, height)
    };
    (w & !1, h & !1)
}

/// Decode the still image and bring it to an encodable size.
pub fn prepare_still(image_bytes: &[u8], max_edge: u32) -> Result<VideoFrame> {
    use image::imageops::FilterType;

    let img = image::load_from_memory(image_bytes).map_err(|e| SpkError::ImageDecode {
        message: e.to_string(),
    })?;
    let (width, height) = fit_even_dimensions(img.width(), img.height(), max_edge);
    if width == 0 || height == 0 {
        return Err(SpkError::ImageDecode {
            message: format!(
                "{}x{} image is too small for an even-sized frame",
                img.width(),
                img.height()
            ),
        });
    }

    let rgba = if (width, height) == (img.width(), img.height()) {
        img.to_rgba8()
    } else {
        tracing::info!(
            from_width = img.width(),
            from_height = img.height(),
            width,
            height,
            "downscaling still image"
        );
        image::imageops::resize(&img.to_rgba8(), width, height, FilterType::Triangle)
    };

    Ok(VideoFrame {
        width,
        height,
        timestamp_us: 0,
        rgba: rgba.into_raw(),
    })
}

/// Number of frames needed to cover `audio` at `fps`, rounded up.
pub fn video_frame_count(audio: &PcmAudio, fps: u32) -> u64 {
    let per_second = audio.format.samples_per_second() as u128;
    if per_second == 0 {
        return 0;
    }
    let scaled = audio.samples.len() as u128 * fps as u128;
    u64::try_from(scaled.div_ceil(per_second)).unwrap_or(u64::MAX)
}

/// Repeat one encoded keyframe `frames` times at `fps`, each copy with its
/// own timestamp and duration derived from its index.
pub fn replicate_keyframe(key: &EncodedChunk, frames: u64, fps: u32) -> Vec<EncodedChunk> {
    if fps == 0 {
        return Vec::new();
    }
    let frame_us = 1_000_000 / fps as i64;

    (0..frames)
        .map(|i| EncodedChunk {
            kind: key.kind,
            timestamp_us: (i as i64 * 1_000_000) / fps as i64,
            duration_us: Some(frame_us),
            data: Arc::clone(&key.data),
        })
        .collect()
}

/// Keep encoder-reported errors as they are; anything else becomes `EncodeFailed`.
fn encoder_error(stage: &str, err: SpkError) -> SpkError {
    match err {
        SpkError::EncodeFailed { .. } => err,
        other => SpkError::encode(format!("{}: {}", stage, other)),
    }
}

/// Encode `audio` and the still image and mux them into one container.
pub async fn render_video(
    audio: &PcmAudio,
    image_bytes: &[u8],
    backend: VideoBackend<'_>,
) -> Result<Vec<u8>> {
    let VideoBackend {
        audio: audio_encoder,
        video: video_encoder,
        muxer,
    } = backend;
    let format = audio.format;

    let audio_config = select_audio_config(&*audio_encoder, format.channels, format.sample_rate).await?;
    tracing::info!(codec = %audio_config.codec, "selected audio codec");

    let frame = prepare_still(image_bytes, defaults::MAX_VIDEO_EDGE)?;
    let mut muxer = muxer.create(&MuxTracks {
        video_codec: "avc",
        width: frame.width,
        height: frame.height,
        audio_codec: audio_config.mux_codec(),
        channels: format.channels,
        sample_rate: format.sample_rate,
    })?;

    // Audio
    audio_encoder
        .configure(&audio_config)
        .await
        .map_err(|e| encoder_error("audio encoder", e))?;
    let mut audio_chunks = audio_encoder
        .encode(AudioData {
            sample_rate: format.sample_rate,
            channels: format.channels,
            frames: audio.frames(),
            timestamp_us: 0,
            data: audio.to_f32(),
        })
        .await
        .map_err(|e| encoder_error("audio encoder", e))?;
    audio_chunks.extend(
        audio_encoder
            .flush()
            .await
            .map_err(|e| encoder_error("audio encoder", e))?,
    );

    // Video: one keyframe, repeated
    video_encoder
        .configure(&VideoCodecConfig {
            codec: defaults::VIDEO_CODEC.to_string(),
            width: frame.width,
            height: frame.height,
            bitrate: defaults::VIDEO_BITRATE,
            framerate: defaults::VIDEO_FPS,
        })
        .await
        .map_err(|e| encoder_error("video encoder", e))?;
    let mut video_chunks = video_encoder
        .encode(&frame, true)
        .await
        .map_err(|e| encoder_error("video encoder", e))?;
    video_chunks.extend(
        video_encoder
            .flush()
            .await
            .map_err(|e| encoder_error("video encoder", e))?,
    );
    let keyframe = video_chunks
        .iter()
        .find(|c| c.kind == ChunkKind::Key)
        .ok_or_else(|| SpkError::encode("video encoder produced no keyframe"))?;
    let frames = video_frame_count(audio, defaults::VIDEO_FPS);
    let replicas = replicate_keyframe(keyframe, frames, defaults::VIDEO_FPS);

    tracing::info!(
        audio_chunks = audio_chunks.len(),
        video_frames = replicas.len(),
        "muxing"
    );
    audio_chunks.sort_by_key(|c| c.timestamp_us);
    let mut audio_iter = audio_chunks.into_iter().peekable();
    let mut video_iter = replicas.into_iter().peekable();
    loop {
        let take_audio = match (audio_iter.peek(), video_iter.peek()) {
            (Some(a), Some(v)) => a.timestamp_us <= v.timestamp_us,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        if take_audio {
            if let Some(chunk) = audio_iter.next() {
                muxer.add_audio_chunk(chunk)?;
            }
        } else if let Some(chunk) = video_iter.next() {
            muxer.add_video_chunk(chunk)?;
        }
    }

    muxer.finalize()
}
