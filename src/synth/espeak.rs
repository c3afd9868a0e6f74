//! eSpeak NG synthesis backend.
//!
//! Runs `espeak-ng --stdout` once per segment, feeding the text on stdin and
//! collecting the WAV stream it writes to stdout.

use crate::error::{Result, SpkError};
use crate::synth::synthesizer::{SynthParams, Synthesizer};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Synthesizer backed by the `espeak-ng` executable.
#[derive(Debug, Clone)]
pub struct EspeakSynthesizer {
    command: String,
}

impl EspeakSynthesizer {
    /// Create a backend invoking `command` (usually `espeak-ng`).
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Command-line arguments for one synthesis call.
    fn args(params: &SynthParams) -> Vec<String> {
        let mut args = vec![
            "--stdout".to_string(),
            "--stdin".to_string(),
            "-s".to_string(),
            params.speed.to_string(),
            "-p".to_string(),
            params.pitch.to_string(),
            "-a".to_string(),
            params.amplitude.to_string(),
            "-g".to_string(),
            params.word_gap.to_string(),
            "-v".to_string(),
            voice_spec(params),
        ];
        if params.ssml {
            args.push("-m".to_string());
        }
        args
    }
}

/// eSpeak selects a variant with `voice+variant`.
fn voice_spec(params: &SynthParams) -> String {
    if params.variant.is_empty() {
        params.voice.clone()
    } else {
        format!("{}+{}", params.voice, params.variant)
    }
}

#[async_trait::async_trait]
impl Synthesizer for EspeakSynthesizer {
    async fn synthesize(&self, text: &str, params: &SynthParams) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.command)
            .args(Self::args(params))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SpkError::spawn(&self.command, e))?;

        let written = match child.stdin.take() {
            Some(mut stdin) => match stdin.write_all(text.as_bytes()).await {
                Ok(()) => stdin.shutdown().await,
                Err(e) => Err(e),
            },
            None => Ok(()),
        };

        // Exit status and stderr explain a broken pipe better than the pipe does
        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpkError::ToolFailed {
                tool: self.command.clone(),
                message: format!("{}: {}", output.status, stderr.trim()),
            });
        }
        written?;
        if output.stdout.is_empty() {
            return Err(SpkError::ToolFailed {
                tool: self.command.clone(),
                message: "produced no audio".to_string(),
            });
        }

        tracing::debug!(
            bytes = output.stdout.len(),
            backend = %self.command,
            "segment synthesized"
        );
        Ok(output.stdout)
    }

    fn name(&self) -> &str {
        &self.command
    }
}
