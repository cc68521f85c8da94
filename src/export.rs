//! Headless dump of every card bitmap in the track.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;
use winit::dpi::PhysicalSize;

use crate::carousel::Carousel;
use crate::config::Configuration;
use crate::error::Result;
use crate::texture::{CardTextureGenerator, TextFace};

/// Builds the track exactly as the window would and writes each card's
/// bitmap to `dir/card-NN.png`, in track order. Returns the written paths.
pub fn export_cards(
    cfg: &Configuration,
    dir: &Path,
    scale_factor: f32,
    face: Box<dyn TextFace>,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut generator = CardTextureGenerator::new(&cfg.card, scale_factor, face);
    // Time seeds never reach the bitmaps; fixed for reproducible runs.
    let mut rng = StdRng::seed_from_u64(0);
    let size = PhysicalSize::new(cfg.window.width, cfg.window.height);
    let carousel = Carousel::new(cfg, size, &mut generator, &mut rng);

    let mut written = Vec::with_capacity(carousel.items().len());
    for item in carousel.items() {
        let path = dir.join(format!("card-{:02}.png", item.slot));
        item.texture.save_png(&path)?;
        written.push(path);
    }
    info!(
        count = written.len(),
        dir = %dir.display(),
        "exported card bitmaps"
    );
    Ok(written)
}
