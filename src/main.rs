//! Binary entrypoint for the review carousel.
//!
//! Delegates all logic to the library crate.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use review_carousel::config::Configuration;
use review_carousel::render::viewer::{GlyphMode, run_windowed};
use review_carousel::texture::testkit::BlockFace;
use review_carousel::texture::{FontFace, TextFace};
use tokio_util::sync::CancellationToken;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "review-carousel",
    version,
    about = "Curved, infinitely looping review carousel"
)]
struct Args {
    /// Path to YAML config; built-in defaults when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write every card bitmap as PNG into DIR and exit
    #[arg(long = "export-cards", value_name = "DIR")]
    export_cards: Option<PathBuf>,

    /// Paint cards with block glyphs instead of system fonts
    #[arg(long = "block-glyphs")]
    block_glyphs: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(format!("review_carousel={level}"))
            .add_directive("wgpu=warn".parse()?)
            .add_directive("winit=warn".parse()?),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<Configuration> {
    let cfg = match path {
        Some(path) => Configuration::from_yaml_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => {
            info!("no --config given; using built-in defaults");
            Configuration::default()
        }
    };
    cfg.validated().context("invalid configuration values")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let cfg = load_config(args.config.as_ref())?;
    let glyph_mode = if args.block_glyphs {
        GlyphMode::Block
    } else {
        GlyphMode::System
    };

    if let Some(dir) = args.export_cards.as_deref() {
        let face: Box<dyn TextFace> = match glyph_mode {
            GlyphMode::System => Box::new(
                FontFace::discover(&cfg.card.fonts).context("failed to load card fonts")?,
            ),
            GlyphMode::Block => Box::new(BlockFace),
        };
        let written = review_carousel::export::export_cards(&cfg, dir, 1.0, face)
            .with_context(|| format!("failed to export cards to {}", dir.display()))?;
        for path in written {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; closing carousel");
            cancel.cancel();
        });
    }

    // Runs the event loop on the main thread until the window closes.
    run_windowed(cfg, cancel, glyph_mode).context("carousel viewer failed")
}
