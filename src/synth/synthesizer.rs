use crate::audio::{AudioFormat, encode_wav};
use crate::defaults;
use crate::error::{Result, SpkError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Trait for text-to-speech synthesis.
///
/// Implementations return a complete WAV container for the given text. The
/// stitcher awaits each call before issuing the next one.
#[async_trait::async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize `text` and return the raw WAV bytes.
    async fn synthesize(&self, text: &str, params: &SynthParams) -> Result<Vec<u8>>;

    /// Human-readable backend name for logs.
    fn name(&self) -> &str;
}

/// Implement Synthesizer for Arc<T> to allow sharing across exports.
#[async_trait::async_trait]
impl<T: Synthesizer + ?Sized> Synthesizer for Arc<T> {
    async fn synthesize(&self, text: &str, params: &SynthParams) -> Result<Vec<u8>> {
        (**self).synthesize(text, params).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Voice parameters passed through to the synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthParams {
    pub voice: String,
    pub variant: String,
    pub speed: u32,
    pub pitch: u32,
    pub amplitude: u32,
    pub word_gap: u32,
    /// Interpret the text as SSML (legacy single-pass mode).
    pub ssml: bool,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            voice: defaults::VOICE.to_string(),
            variant: defaults::VARIANT.to_string(),
            speed: defaults::SPEED,
            pitch: defaults::PITCH,
            amplitude: defaults::AMPLITUDE,
            word_gap: defaults::WORD_GAP,
            ssml: false,
        }
    }
}

/// Mock synthesizer for testing.
///
/// Produces a WAV per call: `padding` zero frames, then `samples_per_char`
/// frames of a constant level per input character, then `padding` zero
/// frames again. Calls are recorded in order.
#[derive(Debug, Clone)]
pub struct MockSynthesizer {
    format: AudioFormat,
    level: i16,
    samples_per_char: usize,
    padding: usize,
    fail_on: Option<String>,
    overrides: HashMap<String, AudioFormat>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockSynthesizer {
    /// Create a mock emitting 16-bit audio in the given format.
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format,
            level: 1000,
            samples_per_char: 10,
            padding: 5,
            fail_on: None,
            overrides: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Configure the sample level emitted for speech.
    pub fn with_level(mut self, level: i16) -> Self {
        self.level = level;
        self
    }

    /// Configure the number of frames produced per character.
    pub fn with_samples_per_char(mut self, samples_per_char: usize) -> Self {
        self.samples_per_char = samples_per_char;
        self
    }

    /// Configure the zero padding emitted around each utterance.
    pub fn with_padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    /// Configure the mock to fail whenever it is asked to speak `text`.
    pub fn with_failure_on(mut self, text: &str) -> Self {
        self.fail_on = Some(text.to_string());
        self
    }

    /// Report a different format for one specific text.
    pub fn with_format_for(mut self, text: &str, format: AudioFormat) -> Self {
        self.overrides.insert(text.to_string(), format);
        self
    }

    /// Texts synthesized so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Speech frames (excluding padding) emitted for `text`.
    pub fn speech_frames(&self, text: &str) -> usize {
        text.chars().count() * self.samples_per_char
    }
}

#[async_trait::async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str, _params: &SynthParams) -> Result<Vec<u8>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(text.to_string());
        }

        if self.fail_on.as_deref() == Some(text) {
            return Err(SpkError::ToolFailed {
                tool: "mock".to_string(),
                message: "mock synthesis failure".to_string(),
            });
        }

        let format = self.overrides.get(text).copied().unwrap_or(self.format);
        let channels = format.channels as usize;
        let pad = vec![0i16; self.padding * channels];
        let speech = vec![self.level; self.speech_frames(text) * channels];

        let mut samples = Vec::with_capacity(pad.len() * 2 + speech.len());
        samples.extend_from_slice(&pad);
        samples.extend_from_slice(&speech);
        samples.extend_from_slice(&pad);

        Ok(encode_wav(&samples, format))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
