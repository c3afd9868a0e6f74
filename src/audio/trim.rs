//! Silence trimming for synthesized segments.

/// Return the span between the first and last non-zero sample, inclusive.
///
/// The synthesizer pads every utterance with exact zeros; trimming them keeps
/// stitched segments tight without touching audible content. An all-zero
/// input yields an empty slice.
pub fn trim_silence(samples: &[i16]) -> &[i16] {
    let Some(start) = samples.iter().position(|&s| s != 0) else {
        return &[];
    };
    let end = samples.iter().rposition(|&s| s != 0).unwrap_or(start);
    &samples[start..=end]
}
