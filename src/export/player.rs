//! Preview playback.

use crate::error::{Result, SpkError};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Trait for handing a WAV container to the platform's audio output.
#[async_trait::async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Start playing a complete WAV container.
    ///
    /// Resolves once playback is underway, not when it ends.
    async fn play(&self, wav: &[u8]) -> Result<()>;
}

/// Player that pipes the WAV into a command such as `aplay -` or `paplay`.
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    command: String,
    args: Vec<String>,
}

impl CommandPlayer {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    /// Build from a whitespace-separated command line.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let command = parts.next()?;
        Some(Self::new(command, parts.map(str::to_string).collect()))
    }

    fn failed(&self, output: &std::process::Output) -> SpkError {
        SpkError::ToolFailed {
            tool: self.command.clone(),
            message: format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        }
    }
}

#[async_trait::async_trait]
impl AudioPlayer for CommandPlayer {
    /// Returns once the whole container is in the player's stdin. The player
    /// is then reaped in the background and a late failure is only logged.
    async fn play(&self, wav: &[u8]) -> Result<()> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SpkError::spawn(&self.command, e))?;

        let written = match child.stdin.take() {
            Some(mut stdin) => match stdin.write_all(wav).await {
                Ok(()) => stdin.shutdown().await,
                Err(e) => Err(e),
            },
            None => Ok(()),
        };

        if let Err(e) = written {
            // A player that quits early breaks the pipe; its exit status and
            // stderr say why
            let output = child.wait_with_output().await?;
            if !output.status.success() {
                return Err(self.failed(&output));
            }
            return Err(e.into());
        }

        tracing::debug!(bytes = wav.len(), player = %self.command, "playback started");
        let player = self.clone();
        tokio::spawn(async move {
            match child.wait_with_output().await {
                Ok(output) if !output.status.success() => {
                    tracing::warn!(error = %player.failed(&output), "playback failed");
                }
                Ok(_) => tracing::debug!(player = %player.command, "playback finished"),
                Err(e) => tracing::warn!(player = %player.command, error = %e, "lost track of player"),
            }
        });
        Ok(())
    }
}

/// Player that keeps what it was asked to play, for tests.
#[derive(Debug, Clone, Default)]
pub struct CollectorPlayer {
    played: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl CollectorPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<Vec<u8>> {
        self.played.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl AudioPlayer for CollectorPlayer {
    async fn play(&self, wav: &[u8]) -> Result<()> {
        if let Ok(mut played) = self.played.lock() {
            played.push(wav.to_vec());
        }
        Ok(())
    }
}
