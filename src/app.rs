//! Speaking application entry points.
//!
//! Orchestrates the complete text-to-audio flow:
//! segment → synthesize → stitch → export

use crate::audio::PcmAudio;
use crate::cli::VoiceArgs;
use crate::config::Config;
use crate::error::{Result, SpkError};
use crate::export::{self, AudioPlayer, CommandPlayer, LameEncoder, Sink};
use crate::markup::{self, Segment};
use crate::stitcher::Stitcher;
use crate::synth::Synthesizer;
use owo_colors::OwoColorize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// File formats the command line can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Wav,
    Mp3 { bitrate_kbps: u32 },
}

/// Join positional words, or read all of `stdin` when there are none.
pub fn read_text(words: &[String], mut stdin: impl Read) -> Result<String> {
    let text = if words.is_empty() {
        let mut buf = String::new();
        stdin.read_to_string(&mut buf)?;
        buf
    } else {
        words.join(" ")
    };
    if text.trim().is_empty() {
        return Err(SpkError::NoContent);
    }
    Ok(text)
}

/// Apply command-line overrides and re-check the result.
pub fn apply_overrides(mut config: Config, voice: &VoiceArgs, legacy: bool) -> Result<Config> {
    voice.apply(&mut config);
    if legacy {
        config.synth.legacy = true;
    }
    config.validate()?;
    Ok(config)
}

/// Synthesize `text` into one stitched track, honoring the legacy switch.
pub async fn render<S: Synthesizer>(synth: S, config: &Config, text: &str) -> Result<PcmAudio> {
    let stitcher = Stitcher::new(synth);
    let params = config.synth_params();
    if config.synth.legacy {
        stitcher.stitch_legacy(text, &params).await
    } else {
        stitcher.stitch_text(text, &params).await
    }
}

/// Synthesize and play through `player`.
pub async fn speak<S: Synthesizer>(
    synth: S,
    config: &Config,
    text: &str,
    player: &dyn AudioPlayer,
) -> Result<PcmAudio> {
    let audio = render(synth, config, text).await?;
    export::export(&audio, Sink::Preview(player)).await?;
    Ok(audio)
}

/// Synthesize and write a file into `dir`, returning its path.
pub async fn export_file<S: Synthesizer>(
    synth: S,
    config: &Config,
    text: &str,
    format: FileFormat,
    dir: &Path,
) -> Result<PathBuf> {
    let audio = render(synth, config, text).await?;
    let artifact = match format {
        FileFormat::Wav => export::export(&audio, Sink::Wav).await?,
        FileFormat::Mp3 { bitrate_kbps } => {
            let mut encoder = LameEncoder::new(audio.format, bitrate_kbps)?;
            export::export(&audio, Sink::Mp3(&mut encoder)).await?
        }
    };
    artifact.write_to(dir)
}

/// Write the segmentation of `text` without synthesizing anything.
pub fn write_segments(text: &str, json: bool, out: &mut impl Write) -> Result<()> {
    let segments = markup::segment(text)?;
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&segments)?)?;
        return Ok(());
    }
    for segment in &segments {
        match segment {
            Segment::Speech { text } => writeln!(out, "speech  {:?}", text)?,
            Segment::Silence { duration_ms } => writeln!(out, "pause   {}ms", duration_ms)?,
        }
    }
    Ok(())
}

/// `spk speak`: synthesize and play through the configured player.
pub async fn run_speak<S: Synthesizer>(synth: S, config: &Config, text: &str, quiet: bool) -> Result<()> {
    let player = CommandPlayer::from_command_line(&config.export.player_command).ok_or_else(|| {
        SpkError::ConfigInvalidValue {
            key: "export.player_command".to_string(),
            message: "must not be empty".to_string(),
        }
    })?;
    if !quiet {
        eprintln!("Speaking with '{}'...", config.voice.name);
    }
    let audio = speak(synth, config, text, &player).await?;
    if !quiet {
        eprintln!(
            "{} {:.1}s ({})",
            "Playing".green(),
            audio.duration_secs(),
            audio.format
        );
    }
    Ok(())
}

/// `spk wav` / `spk mp3`: synthesize into a file and report where it went.
pub async fn run_export<S: Synthesizer>(
    synth: S,
    config: &Config,
    text: &str,
    format: FileFormat,
    output_dir: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let dir = output_dir.unwrap_or_else(|| config.output_dir());
    if !quiet {
        eprintln!("Synthesizing with '{}'...", config.voice.name);
    }
    let path = export_file(synth, config, text, format, &dir).await?;
    if quiet {
        println!("{}", path.display());
    } else {
        println!("{} {}", "Wrote".green(), path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioFormat, parse_wav};
    use crate::export::CollectorPlayer;
    use crate::synth::MockSynthesizer;
    use std::io::Cursor;

    fn mock() -> MockSynthesizer {
        MockSynthesizer::new(AudioFormat::new(1, 22050))
            .with_samples_per_char(2)
            .with_padding(5)
    }

    #[test]
    fn read_text_prefers_words() {
        let words = vec!["Hello".to_string(), "[10]".to_string(), "there".to_string()];
        let text = read_text(&words, Cursor::new("ignored")).unwrap();
        assert_eq!(text, "Hello [10] there");
    }

    #[test]
    fn read_text_falls_back_to_stdin() {
        let text = read_text(&[], Cursor::new("from a pipe [200]\n")).unwrap();
        assert_eq!(text, "from a pipe [200]\n");
    }

    #[test]
    fn read_text_rejects_blank_input() {
        assert!(matches!(
            read_text(&[], Cursor::new("  \n")),
            Err(SpkError::NoContent)
        ));
    }

    #[test]
    fn overrides_are_validated() {
        let voice = VoiceArgs {
            speed: Some(5),
            ..Default::default()
        };
        assert!(matches!(
            apply_overrides(Config::default(), &voice, false),
            Err(SpkError::ConfigInvalidValue { .. })
        ));

        let config = apply_overrides(Config::default(), &VoiceArgs::default(), true).unwrap();
        assert!(config.synth.legacy);
    }

    #[tokio::test]
    async fn render_switches_to_legacy_mode() {
        let synth = mock();
        let mut config = Config::default();
        config.synth.legacy = true;

        render(synth.clone(), &config, "a [5] b").await.unwrap();

        assert_eq!(synth.calls(), vec![r#"a <break time="5ms"/> b"#]);
    }

    #[tokio::test]
    async fn speak_plays_stitched_wav() {
        let player = CollectorPlayer::new();

        let audio = speak(mock(), &Config::default(), "ab [1] c", &player)
            .await
            .unwrap();

        let played = player.played();
        assert_eq!(played.len(), 1);
        assert_eq!(parse_wav(&played[0]).unwrap().samples, audio.samples);
        // 2 chars * 2 + 22 silence + 1 char * 2
        assert_eq!(audio.samples.len(), 4 + 22 + 2);
    }

    #[tokio::test]
    async fn export_file_writes_wav_into_directory() {
        let dir = tempfile::tempdir().unwrap();

        let path = export_file(
            mock(),
            &Config::default(),
            "hello",
            FileFormat::Wav,
            dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(path.parent(), Some(dir.path()));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with("_spk.wav"), "unexpected name {}", name);
        let parsed = parse_wav(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(parsed.samples.len(), 10);
    }

    #[tokio::test]
    async fn export_file_writes_mp3_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let synth = MockSynthesizer::new(AudioFormat::new(1, 22050)).with_samples_per_char(400);

        let path = export_file(
            synth,
            &Config::default(),
            "a longer sentence [200] and more",
            FileFormat::Mp3 { bitrate_kbps: 64 },
            dir.path(),
        )
        .await
        .unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with("_spk.mp3"), "unexpected name {}", name);
        let bytes = std::fs::read(&path).unwrap();
        assert!(!bytes.is_empty());
        assert!(bytes.starts_with(b"ID3") || bytes[0] == 0xFF);
    }

    #[tokio::test]
    async fn export_file_rejects_unsupported_bitrate() {
        let dir = tempfile::tempdir().unwrap();

        let result = export_file(
            mock(),
            &Config::default(),
            "hello",
            FileFormat::Mp3 { bitrate_kbps: 100 },
            dir.path(),
        )
        .await;

        assert!(matches!(result, Err(SpkError::EncodeFailed { .. })));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn segments_listing() {
        let mut out = Vec::new();
        write_segments("Hi [250] there", false, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "speech  \"Hi\"\npause   250ms\nspeech  \"there\"\n"
        );
    }

    #[test]
    fn segments_write_failure_is_io() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        for json in [false, true] {
            assert!(matches!(
                write_segments("hi [5]", json, &mut Closed),
                Err(SpkError::Io(_))
            ));
        }
    }

    #[test]
    fn segments_json() {
        let mut out = Vec::new();
        write_segments("[5] go", true, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                {"type": "silence", "duration_ms": 5},
                {"type": "speech", "text": "go"}
            ])
        );
    }
}
