//! Speech synthesis boundary.

pub mod espeak;
pub mod synthesizer;

pub use espeak::EspeakSynthesizer;
pub use synthesizer::{MockSynthesizer, SynthParams, Synthesizer};
