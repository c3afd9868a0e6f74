//! Export of a stitched track to its delivery formats.

pub mod mp3;
pub mod player;
#[cfg(feature = "video")]
pub mod video;

pub use mp3::{BlockEncoder, LameEncoder, encode_blocks};
pub use player::{AudioPlayer, CollectorPlayer, CommandPlayer};
#[cfg(feature = "video")]
pub use video::{VideoBackend, render_video};

use crate::audio::{PcmAudio, encode_wav};
use crate::defaults;
use crate::error::Result;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

pub const MIME_WAV: &str = "audio/wav";
pub const MIME_MP3: &str = "audio/mpeg";
pub const MIME_MP4: &str = "video/mp4";

/// Where a stitched track should go.
pub enum Sink<'a> {
    /// Play it immediately.
    Preview(&'a dyn AudioPlayer),
    /// Uncompressed WAV file.
    Wav,
    /// Compressed audio through a block encoder.
    Mp3(&'a mut dyn BlockEncoder),
    /// Still image plus audio, muxed into MP4.
    #[cfg(feature = "video")]
    Video {
        image: &'a [u8],
        backend: VideoBackend<'a>,
    },
}

impl Sink<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Sink::Preview(_) => "preview",
            Sink::Wav => "wav",
            Sink::Mp3(_) => "mp3",
            #[cfg(feature = "video")]
            Sink::Video { .. } => "video",
        }
    }
}

/// Finished export, ready to be written or downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub filename: String,
}

impl ExportArtifact {
    /// Write into `dir` (created if missing) and return the full path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        fs::write(&path, &self.bytes)?;
        tracing::info!(path = %path.display(), bytes = self.bytes.len(), "artifact written");
        Ok(path)
    }
}

/// `YYYY-MM-DD_HH-MM-SS_spk.<ext>` for the given local time.
pub fn artifact_filename(extension: &str, at: &DateTime<Local>) -> String {
    format!(
        "{}{}.{}",
        at.format("%Y-%m-%d_%H-%M-%S"),
        defaults::FILENAME_SUFFIX,
        extension
    )
}

/// Export `audio` to `sink`, naming the artifact after the current time.
pub async fn export(audio: &PcmAudio, sink: Sink<'_>) -> Result<ExportArtifact> {
    export_at(audio, sink, Local::now()).await
}

/// Export `audio` to `sink`, naming the artifact after `at`.
pub async fn export_at(
    audio: &PcmAudio,
    sink: Sink<'_>,
    at: DateTime<Local>,
) -> Result<ExportArtifact> {
    tracing::info!(sink = sink.name(), duration_secs = audio.duration_secs(), "exporting");

    let (bytes, mime, extension) = match sink {
        Sink::Preview(player) => {
            let wav = encode_wav(&audio.samples, audio.format);
            player.play(&wav).await?;
            (wav, MIME_WAV, "wav")
        }
        Sink::Wav => (encode_wav(&audio.samples, audio.format), MIME_WAV, "wav"),
        Sink::Mp3(encoder) => (encode_blocks(encoder, &audio.samples)?, MIME_MP3, "mp3"),
        #[cfg(feature = "video")]
        Sink::Video { image, backend } => (render_video(audio, image, backend).await?, MIME_MP4, "mp4"),
    };

    Ok(ExportArtifact {
        bytes,
        mime,
        filename: artifact_filename(extension, &at),
    })
}
