//! Binary entrypoint for the album art display.

use std::path::{Path, PathBuf};

use album_art_display::config::Configuration;
use album_art_display::fetch::{HttpFetcher, http_agent};
use album_art_display::render::text::FontFace;
use album_art_display::spotify::SpotifyProvider;
use album_art_display::tasks::{display::DisplayLoop, viewer};
use album_art_display::track::TrackProvider;
use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio_util::sync::CancellationToken;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(
    name = "album-art-display",
    version,
    about = "Full-screen album art for whatever is playing"
)]
struct Cli {
    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE", default_value = "app_config.yaml")]
    config: PathBuf,

    /// Query the current track once, print it and exit without a window
    #[arg(long)]
    once: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(format!("album_art_display={level}").parse()?)
        .add_directive("winit=warn".parse()?)
        .add_directive("ureq=warn".parse()?);
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

fn load_configuration(path: &Path) -> Result<Configuration> {
    Configuration::from_yaml_file(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?
        .validated()
        .context("invalid configuration values")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let cfg = match load_configuration(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::error!("{err:?}");
            return Err(err);
        }
    };
    info!(config = %cli.config.display(), "loaded configuration");
    tracing::debug!("{cfg:#?}");

    let agent = http_agent(cfg.timings.request_timeout);
    let mut provider = SpotifyProvider::new(cfg.credentials.clone(), agent.clone());

    if cli.once {
        // Blocking HTTP; keep it off the runtime's worker threads.
        let track = tokio::task::spawn_blocking(move || provider.current_track())
            .await
            .context("provider query panicked")?
            .context("failed to query the current track")?;
        match track {
            Some(track) => println!(
                "{} by {} ({})\nart: {}",
                track.title, track.artist, track.release_date, track.album_art_url
            ),
            None => println!("nothing playing"),
        }
        return Ok(());
    }

    let font = FontFace::load(&cfg.fonts.family, cfg.fonts.bold)
        .with_context(|| format!("failed to load font '{}'", cfg.fonts.family))?;
    let display = DisplayLoop::new(cfg.clone(), provider, HttpFetcher::new(agent));

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    // Runs the event loop on the main thread until the window closes or
    // cancellation occurs.
    let result = viewer::run_windowed(cfg, display, font, cancel.clone()).context("viewer failed");
    cancel.cancel();
    if let Err(err) = &result {
        tracing::error!("{err:?}");
    }
    result
}
