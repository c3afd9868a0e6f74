use crate::defaults;
use crate::error::SpkError;
use crate::synth::SynthParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub voice: VoiceConfig,
    pub synth: SynthConfig,
    pub export: ExportConfig,
}

/// Voice parameters handed to the synthesizer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VoiceConfig {
    pub name: String,
    pub variant: String,
    pub speed: u32,
    pub pitch: u32,
    pub amplitude: u32,
    pub word_gap: u32,
}

/// Synthesizer backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynthConfig {
    pub command: String,
    /// Send the whole text in one SSML call instead of stitching segments
    pub legacy: bool,
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory for written files (current directory when unset)
    pub output_dir: Option<PathBuf>,
    pub mp3_bitrate: u32,
    pub player_command: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            name: defaults::VOICE.to_string(),
            variant: defaults::VARIANT.to_string(),
            speed: defaults::SPEED,
            pitch: defaults::PITCH,
            amplitude: defaults::AMPLITUDE,
            word_gap: defaults::WORD_GAP,
        }
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            command: defaults::ESPEAK_COMMAND.to_string(),
            legacy: false,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            mp3_bitrate: defaults::MP3_BITRATE_KBPS,
            player_command: defaults::PLAYER_COMMAND.to_string(),
        }
    }
}

/// Constant bitrates (kbit/s) the MP3 encoder offers at 32 kbit/s and up.
const MP3_BITRATES: [u32; 13] = [32, 40, 48, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320];

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML or out-of-range values.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents).map_err(SpkError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e)
                if e.downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound) =>
            {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.context(format!("Failed to load config from {}", path.display()))),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SPK_VOICE → voice.name
    /// - SPK_VARIANT → voice.variant
    /// - SPK_ESPEAK → synth.command
    /// - SPK_OUTPUT_DIR → export.output_dir
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(voice) = std::env::var("SPK_VOICE")
            && !voice.is_empty()
        {
            self.voice.name = voice;
        }

        if let Ok(variant) = std::env::var("SPK_VARIANT")
            && !variant.is_empty()
        {
            self.voice.variant = variant;
        }

        if let Ok(command) = std::env::var("SPK_ESPEAK")
            && !command.is_empty()
        {
            self.synth.command = command;
        }

        if let Ok(dir) = std::env::var("SPK_OUTPUT_DIR")
            && !dir.is_empty()
        {
            self.export.output_dir = Some(PathBuf::from(dir));
        }

        self
    }

    /// Check value ranges the synthesizer and encoder accept.
    pub fn validate(&self) -> Result<(), SpkError> {
        fn invalid(key: &str, message: String) -> SpkError {
            SpkError::ConfigInvalidValue {
                key: key.to_string(),
                message,
            }
        }

        if !(80..=450).contains(&self.voice.speed) {
            return Err(invalid(
                "voice.speed",
                format!("{} is outside 80..=450 words per minute", self.voice.speed),
            ));
        }
        if self.voice.pitch > 99 {
            return Err(invalid(
                "voice.pitch",
                format!("{} is outside 0..=99", self.voice.pitch),
            ));
        }
        if self.voice.amplitude > 200 {
            return Err(invalid(
                "voice.amplitude",
                format!("{} is outside 0..=200", self.voice.amplitude),
            ));
        }
        if self.voice.name.trim().is_empty() {
            return Err(invalid("voice.name", "must not be empty".to_string()));
        }
        if !MP3_BITRATES.contains(&self.export.mp3_bitrate) {
            return Err(invalid(
                "export.mp3_bitrate",
                format!("{} is not a valid MP3 bitrate", self.export.mp3_bitrate),
            ));
        }
        Ok(())
    }

    /// Synthesizer parameters for this configuration.
    pub fn synth_params(&self) -> SynthParams {
        SynthParams {
            voice: self.voice.name.clone(),
            variant: self.voice.variant.clone(),
            speed: self.voice.speed,
            pitch: self.voice.pitch,
            amplitude: self.voice.amplitude,
            word_gap: self.voice.word_gap,
            ssml: false,
        }
    }

    /// Directory exports are written to.
    pub fn output_dir(&self) -> PathBuf {
        self.export
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/spk/config.toml on Linux
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(dir.join("spk").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_spk_env() {
        remove_env("SPK_VOICE");
        remove_env("SPK_VARIANT");
        remove_env("SPK_ESPEAK");
        remove_env("SPK_OUTPUT_DIR");
    }

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        temp_file
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.voice.name, "en-gb-x-rp");
        assert_eq!(config.voice.variant, "klatt");
        assert_eq!(config.voice.speed, 175);
        assert_eq!(config.voice.pitch, 50);
        assert_eq!(config.voice.amplitude, 100);
        assert_eq!(config.voice.word_gap, 2);

        assert_eq!(config.synth.command, "espeak-ng");
        assert!(!config.synth.legacy);

        assert_eq!(config.export.output_dir, None);
        assert_eq!(config.export.mp3_bitrate, 128);

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let temp_file = write_temp(
            r#"
            [voice]
            name = "de"
            variant = "m3"
            speed = 140
            pitch = 30
            amplitude = 150
            word_gap = 5

            [synth]
            command = "/opt/espeak/bin/espeak-ng"
            legacy = true

            [export]
            output_dir = "/tmp/spk-out"
            mp3_bitrate = 192
            player_command = "paplay"
        "#,
        );

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.voice.name, "de");
        assert_eq!(config.voice.variant, "m3");
        assert_eq!(config.voice.speed, 140);
        assert_eq!(config.voice.pitch, 30);
        assert_eq!(config.voice.amplitude, 150);
        assert_eq!(config.voice.word_gap, 5);

        assert_eq!(config.synth.command, "/opt/espeak/bin/espeak-ng");
        assert!(config.synth.legacy);

        assert_eq!(config.export.output_dir, Some(PathBuf::from("/tmp/spk-out")));
        assert_eq!(config.export.mp3_bitrate, 192);
        assert_eq!(config.export.player_command, "paplay");
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let temp_file = write_temp(
            r#"
            [voice]
            speed = 220
        "#,
        );

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.voice.speed, 220);
        assert_eq!(config.voice.name, "en-gb-x-rp");
        assert_eq!(config.synth, SynthConfig::default());
        assert_eq!(config.export, ExportConfig::default());
    }

    #[test]
    fn test_out_of_range_value_is_rejected() {
        let temp_file = write_temp(
            r#"
            [voice]
            pitch = 120
        "#,
        );

        let err = Config::load(temp_file.path()).unwrap_err();
        let spk = err.downcast_ref::<SpkError>().unwrap();
        assert!(matches!(spk, SpkError::ConfigInvalidValue { key, .. } if key == "voice.pitch"));
    }

    #[test]
    fn test_validate_rejects_each_bad_field() {
        let cases: Vec<(&str, Box<dyn Fn(&mut Config)>)> = vec![
            ("voice.speed", Box::new(|c| c.voice.speed = 10)),
            ("voice.amplitude", Box::new(|c| c.voice.amplitude = 201)),
            ("voice.name", Box::new(|c| c.voice.name = "  ".to_string())),
            ("export.mp3_bitrate", Box::new(|c| c.export.mp3_bitrate = 100)),
        ];

        for (expected, mutate) in cases {
            let mut config = Config::default();
            mutate(&mut config);
            match config.validate() {
                Err(SpkError::ConfigInvalidValue { key, .. }) => assert_eq!(key, expected),
                other => panic!("Expected invalid {}, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_env_override_voice() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_spk_env();

        set_env("SPK_VOICE", "fr");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.voice.name, "fr");
        assert_eq!(config.voice.variant, "klatt"); // Not overridden

        clear_spk_env();
    }

    #[test]
    fn test_env_override_all() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_spk_env();

        set_env("SPK_VOICE", "es");
        set_env("SPK_VARIANT", "f2");
        set_env("SPK_ESPEAK", "espeak");
        set_env("SPK_OUTPUT_DIR", "/srv/audio");

        let config = Config::default().with_env_overrides();

        assert_eq!(config.voice.name, "es");
        assert_eq!(config.voice.variant, "f2");
        assert_eq!(config.synth.command, "espeak");
        assert_eq!(config.output_dir(), PathBuf::from("/srv/audio"));

        clear_spk_env();
    }

    #[test]
    fn test_env_override_empty_string_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_spk_env();

        set_env("SPK_VOICE", "");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.voice.name, "en-gb-x-rp");

        clear_spk_env();
    }

    #[test]
    fn test_synth_params_follow_voice_section() {
        let mut config = Config::default();
        config.voice.speed = 300;
        config.voice.variant = "m1".to_string();

        let params = config.synth_params();

        assert_eq!(params.speed, 300);
        assert_eq!(params.variant, "m1");
        assert!(!params.ssml);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let temp_file = write_temp(
            r#"
            [voice
            name = "broken
        "#,
        );

        assert!(Config::load(temp_file.path()).is_err());
    }

    #[test]
    fn test_default_path_is_xdg_compliant() {
        let path = Config::default_path().unwrap();
        let path_str = path.to_string_lossy();

        assert!(path_str.contains("spk"));
        assert!(path_str.ends_with("config.toml"));
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing_path = dir.path().join("nonexistent.toml");

        let config = Config::load_or_default(&missing_path).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_errors_on_invalid_toml() {
        let temp_file = write_temp("[voice\nname = \"broken\n");

        let err = Config::load_or_default(temp_file.path()).unwrap_err();

        assert!(err.to_string().contains("Failed to load config"));
    }
}
