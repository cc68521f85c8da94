use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use tracing::warn;

use crate::review::{MAX_RATING, ReviewRecord};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Signed curvature of the track; 0 keeps every card on a straight line.
    pub bend: f32,
    /// Corner radius of each card in UV units (0.0..=0.5).
    pub border_radius: f32,
    /// Reviews to show. Empty means the built-in set.
    pub reviews: Vec<ReviewRecord>,
    pub scroll: ScrollOptions,
    pub camera: CameraOptions,
    pub layout: LayoutOptions,
    pub card: CardOptions,
    pub mesh: MeshOptions,
    pub window: WindowOptions,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(mut self) -> Result<Self> {
        ensure!(self.bend.is_finite(), "bend must be a finite number");
        ensure!(
            (0.0..=0.5).contains(&self.border_radius),
            "border-radius must be within 0.0..=0.5"
        );
        self.scroll.validate().context("invalid scroll options")?;
        self.camera.validate().context("invalid camera options")?;
        self.layout.validate().context("invalid layout options")?;
        self.card.validate().context("invalid card options")?;
        ensure!(
            self.mesh.width_segments > 0 && self.mesh.height_segments > 0,
            "mesh segments must be greater than zero"
        );
        ensure!(
            self.window.width > 0 && self.window.height > 0,
            "window size must be non-zero"
        );
        for review in &mut self.reviews {
            if review.rating > MAX_RATING {
                warn!(
                    company = %review.company,
                    rating = review.rating,
                    "review rating above {MAX_RATING}; clamping"
                );
                review.rating = MAX_RATING;
            }
        }
        Ok(self)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            bend: 1.5,
            border_radius: 0.04,
            reviews: Vec::new(),
            scroll: ScrollOptions::default(),
            camera: CameraOptions::default(),
            layout: LayoutOptions::default(),
            card: CardOptions::default(),
            mesh: MeshOptions::default(),
            window: WindowOptions::default(),
        }
    }
}

/// Longest quiet period before a wheel snap; beyond this the snap reads as lag.
pub const MAX_SNAP_DEBOUNCE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ScrollOptions {
    /// Fraction of the remaining distance covered per nominal frame.
    pub easing: f32,
    /// World units per logical pixel of horizontal drag.
    pub drag_sensitivity: f32,
    /// World units added to the target per wheel notch.
    pub wheel_step: f32,
    /// Quiet period after the last wheel event before snapping.
    #[serde(with = "humantime_serde")]
    pub snap_debounce: Duration,
}

impl ScrollOptions {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.easing > 0.0 && self.easing <= 1.0,
            "scroll.easing must be within (0, 1]"
        );
        ensure!(
            self.drag_sensitivity > 0.0,
            "scroll.drag-sensitivity must be positive"
        );
        ensure!(self.wheel_step > 0.0, "scroll.wheel-step must be positive");
        ensure!(
            self.snap_debounce <= MAX_SNAP_DEBOUNCE,
            "scroll.snap-debounce must be at most {}, got {}",
            humantime::format_duration(MAX_SNAP_DEBOUNCE),
            humantime::format_duration(self.snap_debounce)
        );
        Ok(())
    }
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            easing: 0.08,
            drag_sensitivity: 0.04,
            wheel_step: 1.5,
            snap_debounce: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CameraOptions {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Distance from the camera to the card plane along +Z.
    pub distance: f32,
}

impl CameraOptions {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.fov_degrees > 0.0 && self.fov_degrees < 180.0,
            "camera.fov-degrees must be within (0, 180)"
        );
        ensure!(self.distance > 0.0, "camera.distance must be positive");
        Ok(())
    }
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            distance: 20.0,
        }
    }
}

/// Pixel reference sizes that map a card onto the viewport at any window size.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LayoutOptions {
    pub reference_height_px: f32,
    pub card_width_px: f32,
    pub card_height_px: f32,
    /// Gap between neighbouring cards in world units.
    pub padding: f32,
}

impl LayoutOptions {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.reference_height_px > 0.0,
            "layout.reference-height-px must be positive"
        );
        ensure!(
            self.card_width_px > 0.0 && self.card_height_px > 0.0,
            "layout card size must be positive"
        );
        ensure!(self.padding >= 0.0, "layout.padding must not be negative");
        Ok(())
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            reference_height_px: 1500.0,
            card_width_px: 800.0,
            card_height_px: 900.0,
            padding: 3.0,
        }
    }
}

/// Look of the generated card bitmap. Sizes are logical pixels.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CardOptions {
    pub width: u32,
    pub height: u32,
    pub corner_radius: f32,
    pub max_lines: usize,
    pub colors: CardColors,
    pub fonts: CardFonts,
}

impl CardOptions {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.width >= 200 && self.height >= 200,
            "card size must be at least 200x200"
        );
        ensure!(
            self.corner_radius >= 0.0,
            "card.corner-radius must not be negative"
        );
        ensure!(self.max_lines > 0, "card.max-lines must be greater than zero");
        Ok(())
    }
}

impl Default for CardOptions {
    fn default() -> Self {
        Self {
            width: 700,
            height: 450,
            corner_radius: 24.0,
            max_lines: 4,
            colors: CardColors::default(),
            fonts: CardFonts::default(),
        }
    }
}

/// Hex colour strings (`#rgb`, `#rrggbb` or `#rrggbbaa`). Unparseable
/// values fall back to the defaults with a warning.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CardColors {
    pub background_start: String,
    pub background_end: String,
    pub border: String,
    pub title_start: String,
    pub title_end: String,
    pub title_shadow: String,
    pub star_filled: String,
    pub star_empty: String,
    pub quote: String,
    pub body: String,
}

impl Default for CardColors {
    fn default() -> Self {
        Self {
            background_start: "#1e293b".into(),
            background_end: "#0f172a".into(),
            border: "#334155".into(),
            title_start: "#fbbf24".into(),
            title_end: "#f97316".into(),
            title_shadow: "#0000004d".into(),
            star_filled: "#f59e0b".into(),
            star_empty: "#64748b".into(),
            quote: "#fbbf2433".into(),
            body: "#e2e8f0".into(),
        }
    }
}

/// Font family names looked up through the system font database.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CardFonts {
    pub sans: Option<String>,
    pub serif: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MeshOptions {
    pub width_segments: u32,
    pub height_segments: u32,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            width_segments: 120,
            height_segments: 80,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WindowOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub background: String,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            title: "Client Testimonials".into(),
            width: 1280,
            height: 550,
            background: "#0b1120".into(),
        }
    }
}
