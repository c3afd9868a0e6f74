//! Default constants shared across the stitching and export stages.

/// Sample rate assumed before any speech segment has reported its format.
///
/// Matches the rate eSpeak emits for its stock voices, so leading silence is
/// usually already correct.
pub const SAMPLE_RATE: u32 = 22050;

/// Channel count assumed before any speech segment has reported its format.
pub const CHANNELS: u16 = 1;

/// Samples handed to the compressed-audio encoder per call.
///
/// One MPEG-1 Layer III frame.
pub const MP3_FRAME_SAMPLES: usize = 1152;

/// MP3 bitrate in kbit/s.
pub const MP3_BITRATE_KBPS: u32 = 128;

/// Bitrate for the audio track of video exports.
pub const AUDIO_BITRATE: u32 = 128_000;

/// Longest edge allowed for the still image of a video export.
pub const MAX_VIDEO_EDGE: u32 = 1080;

/// Frame rate at which the still keyframe is replicated.
pub const VIDEO_FPS: u32 = 30;

/// Bitrate for the H.264 keyframe.
pub const VIDEO_BITRATE: u32 = 4_000_000;

/// H.264 Main profile, level 5.1.
pub const VIDEO_CODEC: &str = "avc1.4d4033";

/// Suffix appended after the timestamp in exported filenames.
pub const FILENAME_SUFFIX: &str = "_spk";

/// Default eSpeak voice.
pub const VOICE: &str = "en-gb-x-rp";

/// Default eSpeak voice variant.
pub const VARIANT: &str = "klatt";

/// Speaking speed in words per minute.
pub const SPEED: u32 = 175;

/// Pitch adjustment, 0 to 99.
pub const PITCH: u32 = 50;

/// Amplitude, 0 to 200.
pub const AMPLITUDE: u32 = 100;

/// Extra pause between words, in units of 10ms at the default speed.
pub const WORD_GAP: u32 = 2;

/// Synthesizer executable.
pub const ESPEAK_COMMAND: &str = "espeak-ng";

/// Command line that plays a WAV stream from stdin.
pub const PLAYER_COMMAND: &str = "aplay -q -";
