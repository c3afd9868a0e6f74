use anyhow::Result;
use clap::{CommandFactory, Parser};
use spk::app::{self, FileFormat};
use spk::cli::{Cli, Commands};
use spk::config::Config;
use spk::synth::EspeakSynthesizer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);
    tracing::debug!(version = %spk::version_string(), "starting");

    match &cli.command {
        Commands::Speak { text } => {
            let config = load_config(&cli)?;
            let text = app::read_text(&text.text, std::io::stdin())?;
            let synth = EspeakSynthesizer::new(&config.synth.command);
            app::run_speak(synth, &config, &text, cli.quiet).await?;
        }
        Commands::Wav { text, output_dir } => {
            let config = load_config(&cli)?;
            let text = app::read_text(&text.text, std::io::stdin())?;
            let synth = EspeakSynthesizer::new(&config.synth.command);
            let dir = output_dir.clone();
            app::run_export(synth, &config, &text, FileFormat::Wav, dir, cli.quiet).await?;
        }
        Commands::Mp3 {
            text,
            output_dir,
            bitrate,
        } => {
            let config = load_mp3_config(&cli, *bitrate)?;
            let text = app::read_text(&text.text, std::io::stdin())?;
            let synth = EspeakSynthesizer::new(&config.synth.command);
            let format = FileFormat::Mp3 {
                bitrate_kbps: config.export.mp3_bitrate,
            };
            let dir = output_dir.clone();
            app::run_export(synth, &config, &text, format, dir, cli.quiet).await?;
        }
        Commands::Segments { text, json } => {
            let text = app::read_text(&text.text, std::io::stdin())?;
            app::write_segments(&text, *json, &mut std::io::stdout())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "spk", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over `-q`/`-v`.
fn init_tracing(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("spk={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/spk/config.toml)
/// 3. Built-in defaults
///
/// Environment variables then override the file, and command-line flags
/// override both.
fn load_config(cli: &Cli) -> Result<Config> {
    let config = match cli.config.as_deref() {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path()?)?,
    };
    Ok(app::apply_overrides(
        config.with_env_overrides(),
        &cli.voice,
        cli.legacy,
    )?)
}

/// [`load_config`] plus the `mp3 --bitrate` override.
fn load_mp3_config(cli: &Cli, bitrate: Option<u32>) -> Result<Config> {
    let mut config = load_config(cli)?;
    if let Some(kbps) = bitrate {
        config.export.mp3_bitrate = kbps;
        config.validate()?;
    }
    Ok(config)
}
