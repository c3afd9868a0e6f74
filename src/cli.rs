//! Command-line interface for spk
//!
//! Provides argument parsing using clap derive macros.

use crate::config::Config;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Speak marked-up text with programmable pauses
#[derive(Parser, Debug)]
#[command(
    name = "spk",
    version,
    about = "Speak marked-up text with programmable pauses",
    after_help = "Write [N] anywhere in the text for a pause of N milliseconds, e.g.\n  spk wav \"Ready [750] set [1500] go\""
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: stages, -vv: every segment)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(flatten)]
    pub voice: VoiceArgs,

    /// Send the whole text to the synthesizer in one call, pauses as SSML breaks
    #[arg(long, global = true)]
    pub legacy: bool,
}

/// Voice overrides; anything unset falls back to the configuration.
#[derive(Args, Debug, Default, Clone, PartialEq)]
pub struct VoiceArgs {
    /// Synthesizer voice (e.g., en-gb-x-rp, de, fr)
    #[arg(long, global = true, value_name = "VOICE")]
    pub voice: Option<String>,

    /// Voice variant (e.g., klatt, m3, f2)
    #[arg(long, global = true, value_name = "VARIANT")]
    pub variant: Option<String>,

    /// Speed in words per minute (80-450)
    #[arg(long, short = 's', global = true, value_name = "WPM")]
    pub speed: Option<u32>,

    /// Pitch (0-99)
    #[arg(long, short = 'p', global = true, value_name = "PITCH")]
    pub pitch: Option<u32>,

    /// Amplitude (0-200)
    #[arg(long, global = true, value_name = "AMP")]
    pub amplitude: Option<u32>,

    /// Extra pause between words, in 10ms units
    #[arg(long, global = true, value_name = "GAP")]
    pub word_gap: Option<u32>,
}

impl VoiceArgs {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(voice) = &self.voice {
            config.voice.name = voice.clone();
        }
        if let Some(variant) = &self.variant {
            config.voice.variant = variant.clone();
        }
        if let Some(speed) = self.speed {
            config.voice.speed = speed;
        }
        if let Some(pitch) = self.pitch {
            config.voice.pitch = pitch;
        }
        if let Some(amplitude) = self.amplitude {
            config.voice.amplitude = amplitude;
        }
        if let Some(word_gap) = self.word_gap {
            config.voice.word_gap = word_gap;
        }
    }
}

/// Text to speak: positional words, or stdin when none are given.
#[derive(Args, Debug, Default, Clone, PartialEq)]
pub struct TextArgs {
    /// Text with optional [N] pause markers
    #[arg(value_name = "TEXT")]
    pub text: Vec<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesize and play immediately
    Speak {
        #[command(flatten)]
        text: TextArgs,
    },

    /// Synthesize to an uncompressed WAV file
    Wav {
        #[command(flatten)]
        text: TextArgs,

        /// Output directory (default: config export.output_dir, then current directory)
        #[arg(long, short = 'o', value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Synthesize to an MP3 file
    Mp3 {
        #[command(flatten)]
        text: TextArgs,

        /// Output directory (default: config export.output_dir, then current directory)
        #[arg(long, short = 'o', value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Bitrate in kbit/s
        #[arg(long, short = 'b', value_name = "KBPS")]
        bitrate: Option<u32>,
    },

    /// Show how the text splits into speech and pauses, without synthesizing
    Segments {
        #[command(flatten)]
        text: TextArgs,

        /// Print segments as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}
