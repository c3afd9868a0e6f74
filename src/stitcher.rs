//! Segment stitcher.
//!
//! Synthesizes speech segments one at a time, trims the engine's zero
//! padding, and splices them together with generated silence into a single
//! interleaved 16-bit buffer.

use crate::audio::{self, AudioFormat, PcmAudio, parse_wav, trim_silence};
use crate::error::{Result, SpkError};
use crate::markup::{self, Segment};
use crate::synth::{SynthParams, Synthesizer};

/// Accumulated state of one stitching run.
///
/// Silence that precedes the first speech segment is held back until the
/// synthesizer reports its format, so its length is computed at the rate it
/// will actually be played at.
#[derive(Debug, Default)]
struct StitchRun {
    format: Option<AudioFormat>,
    samples: Vec<i16>,
    pending_silence: Vec<u64>,
}

impl StitchRun {
    fn append_silence(&mut self, duration_ms: u64) -> Result<()> {
        match self.format {
            Some(format) => push_zeros(&mut self.samples, format, duration_ms),
            None => {
                self.pending_silence.push(duration_ms);
                Ok(())
            }
        }
    }

    fn append_speech(&mut self, speech: PcmAudio) -> Result<()> {
        let format = match self.format {
            Some(format) => format,
            None => self.adopt(speech.format)?,
        };
        let samples = normalize(speech, format);
        self.samples.extend_from_slice(&samples);
        Ok(())
    }

    /// Lock in the run's format and materialize held-back silence.
    fn adopt(&mut self, format: AudioFormat) -> Result<AudioFormat> {
        tracing::debug!(%format, "adopting synthesizer format");
        self.format = Some(format);
        for duration_ms in std::mem::take(&mut self.pending_silence) {
            push_zeros(&mut self.samples, format, duration_ms)?;
        }
        Ok(format)
    }

    fn finish(mut self) -> Result<PcmAudio> {
        let format = match self.format {
            Some(format) => format,
            None => self.adopt(AudioFormat::default())?,
        };
        Ok(PcmAudio::new(format, self.samples))
    }
}

fn push_zeros(samples: &mut Vec<i16>, format: AudioFormat, duration_ms: u64) -> Result<()> {
    let too_long = || SpkError::SilenceTooLong { duration_ms };
    let count = usize::try_from(format.samples_for_ms(duration_ms)).map_err(|_| too_long())?;
    samples.try_reserve(count).map_err(|_| too_long())?;
    samples.resize(samples.len() + count, 0);
    Ok(())
}

/// Bring a segment into the run's format.
///
/// The synthesizer is expected to be configured identically for every call;
/// if it is not, the segment is remixed and resampled rather than rejected.
fn normalize(speech: PcmAudio, target: AudioFormat) -> Vec<i16> {
    if speech.format == target {
        return speech.samples;
    }
    tracing::warn!(
        from = %speech.format,
        to = %target,
        "synthesizer changed format mid-run, converting segment"
    );
    let remixed = audio::remix(&speech.samples, speech.format.channels, target.channels);
    audio::resample(
        &remixed,
        target.channels,
        speech.format.sample_rate,
        target.sample_rate,
    )
}

/// Drives a [`Synthesizer`] over a segment list.
pub struct Stitcher<S: Synthesizer> {
    synth: S,
}

impl<S: Synthesizer> Stitcher<S> {
    pub fn new(synth: S) -> Self {
        Self { synth }
    }

    pub fn synthesizer(&self) -> &S {
        &self.synth
    }

    /// Segment marked-up text and stitch it.
    pub async fn stitch_text(&self, text: &str, params: &SynthParams) -> Result<PcmAudio> {
        let segments = markup::segment(text)?;
        self.stitch(&segments, params).await
    }

    /// Stitch segments into one buffer, strictly in order.
    ///
    /// Fails on the first speech segment the synthesizer rejects; nothing
    /// from the partial run is returned.
    pub async fn stitch(&self, segments: &[Segment], params: &SynthParams) -> Result<PcmAudio> {
        tracing::info!(
            segments = segments.len(),
            backend = self.synth.name(),
            "stitching"
        );
        let mut run = StitchRun::default();

        for (index, segment) in segments.iter().enumerate() {
            match segment {
                Segment::Speech { text } => {
                    tracing::debug!(index, text = %text, "synthesizing segment");
                    let speech = self.speak(text, params).await?;
                    let trimmed = trim_silence(&speech.samples).to_vec();
                    run.append_speech(PcmAudio::new(speech.format, trimmed))?;
                }
                Segment::Silence { duration_ms } => {
                    tracing::debug!(index, duration_ms, "inserting silence");
                    run.append_silence(*duration_ms)?;
                }
            }
        }

        let audio = run.finish()?;
        tracing::info!(
            samples = audio.samples.len(),
            duration_secs = audio.duration_secs(),
            format = %audio.format,
            "stitching complete"
        );
        Ok(audio)
    }

    /// Legacy single-pass mode: pauses become SSML breaks and the whole text
    /// goes to the synthesizer in one call, untrimmed.
    pub async fn stitch_legacy(&self, text: &str, params: &SynthParams) -> Result<PcmAudio> {
        let ssml = markup::legacy_ssml(text)?;
        tracing::info!(text = %ssml, "sending to engine");
        let params = SynthParams {
            ssml: true,
            ..params.clone()
        };
        self.speak(&ssml, &params).await
    }

    async fn speak(&self, text: &str, params: &SynthParams) -> Result<PcmAudio> {
        let wav = self
            .synth
            .synthesize(text, params)
            .await
            .map_err(|e| SpkError::SynthesisFailed {
                segment: text.to_string(),
                message: e.to_string(),
            })?;
        Ok(parse_wav(&wav)?.into_pcm())
    }
}
