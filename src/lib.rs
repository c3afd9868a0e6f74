//! spk - Speak marked-up text with programmable pauses
//!
//! Splits text on `[N]` pause markers, synthesizes each stretch of speech
//! separately, and stitches the results with exact silences into one track
//! that can be played or exported as WAV, MP3 or a still-image video.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod export;
pub mod markup;
pub mod stitcher;
pub mod synth;

// Composition root for the command line
#[cfg(feature = "cli")]
pub mod app;

// Core traits (synthesize → stitch → export)
pub use export::{AudioPlayer, BlockEncoder};
pub use synth::Synthesizer;

// Pipeline
pub use export::{ExportArtifact, Sink, export};
pub use markup::{Segment, segment};
pub use stitcher::Stitcher;

// Audio
pub use audio::{AudioFormat, PcmAudio};

// Error handling
pub use error::{Result, SpkError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_hash_suffix_matches_build() {
        let ver = version_string();
        match option_env!("GIT_HASH").filter(|h| !h.is_empty()) {
            Some(hash) => assert_eq!(ver, format!("{}+{}", env!("CARGO_PKG_VERSION"), hash)),
            None => assert_eq!(ver, env!("CARGO_PKG_VERSION")),
        }
    }
}
