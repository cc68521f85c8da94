use ab_glyph::{Font, FontArc, FontVec, PxScale, ScaleFont, point};
use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use tracing::{debug, warn};

use crate::config::CardFonts;
use crate::error::{Error, Result};

const SANS_FALLBACKS: &[&str] = &[
    "Inter",
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "Helvetica",
    "Arial",
];
const SERIF_FALLBACKS: &[&str] = &[
    "Georgia",
    "DejaVu Serif",
    "Liberation Serif",
    "Noto Serif",
    "Times New Roman",
];

/// What a run of text is used for on the card; each maps to one font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontRole {
    Body,
    Title,
    Quote,
}

impl FontRole {
    pub fn label(self) -> &'static str {
        match self {
            FontRole::Body => "body",
            FontRole::Title => "title",
            FontRole::Quote => "quote",
        }
    }
}

/// Glyph metrics and coverage for the card painter.
///
/// `px` is the CSS-style font size (the em square). Rasterised coverage is
/// reported through `plot(x, y, coverage)` in bitmap pixels, with `origin` at
/// the left end of the baseline.
pub trait TextFace {
    fn measure(&self, role: FontRole, px: f32, text: &str) -> f32;
    fn ascent(&self, role: FontRole, px: f32) -> f32;
    /// Negative: distance below the baseline.
    fn descent(&self, role: FontRole, px: f32) -> f32;
    fn rasterize(
        &self,
        role: FontRole,
        px: f32,
        text: &str,
        origin: (f32, f32),
        plot: &mut dyn FnMut(i32, i32, f32),
    );
}

/// System fonts resolved through fontdb and drawn with ab_glyph.
pub struct FontFace {
    body: FontArc,
    title: FontArc,
    quote: FontArc,
}

impl FontFace {
    pub fn discover(fonts: &CardFonts) -> Result<Self> {
        let mut db = Database::new();
        db.load_system_fonts();
        debug!(faces = db.len(), "system font database loaded");

        let sans = candidates(fonts.sans.as_deref(), SANS_FALLBACKS);
        let serif = candidates(fonts.serif.as_deref(), SERIF_FALLBACKS);

        let body = load(&db, &sans, Weight::NORMAL)
            .or_else(|| any_face(&db))
            .ok_or(Error::FontUnavailable(FontRole::Body.label()))?;
        let title = load(&db, &sans, Weight::BOLD).unwrap_or_else(|| {
            warn!("no bold sans-serif font found; using the body font for titles");
            body.clone()
        });
        let quote = load(&db, &serif, Weight::BOLD).unwrap_or_else(|| {
            warn!("no serif font found; using the title font for quote marks");
            title.clone()
        });
        Ok(Self { body, title, quote })
    }

    fn font(&self, role: FontRole) -> &FontArc {
        match role {
            FontRole::Body => &self.body,
            FontRole::Title => &self.title,
            FontRole::Quote => &self.quote,
        }
    }
}

impl TextFace for FontFace {
    fn measure(&self, role: FontRole, px: f32, text: &str) -> f32 {
        let font = self.font(role);
        let scaled = font.as_scaled(em_scale(font, px));
        let mut width = 0.0;
        let mut previous = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width
    }

    fn ascent(&self, role: FontRole, px: f32) -> f32 {
        let font = self.font(role);
        font.as_scaled(em_scale(font, px)).ascent()
    }

    fn descent(&self, role: FontRole, px: f32) -> f32 {
        let font = self.font(role);
        font.as_scaled(em_scale(font, px)).descent()
    }

    fn rasterize(
        &self,
        role: FontRole,
        px: f32,
        text: &str,
        origin: (f32, f32),
        plot: &mut dyn FnMut(i32, i32, f32),
    ) {
        let font = self.font(role);
        let scale = em_scale(font, px);
        let scaled = font.as_scaled(scale);
        let mut caret = point(origin.0, origin.1);
        let mut previous = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                caret.x += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scale, caret);
            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                let left = bounds.min.x.floor() as i32;
                let top = bounds.min.y.floor() as i32;
                outlined.draw(|gx, gy, coverage| plot(left + gx as i32, top + gy as i32, coverage));
            }
            caret.x += scaled.h_advance(id);
            previous = Some(id);
        }
    }
}

/// ab_glyph scales by ascent-to-descent height; canvas sizes name the em.
fn em_scale(font: &FontArc, px: f32) -> PxScale {
    match font.units_per_em() {
        Some(units) if units > 0.0 => PxScale::from(px * font.height_unscaled() / units),
        _ => PxScale::from(px),
    }
}

fn candidates<'a>(configured: Option<&'a str>, fallbacks: &[&'a str]) -> Vec<&'a str> {
    configured.into_iter().chain(fallbacks.iter().copied()).collect()
}

fn load(db: &Database, names: &[&str], weight: Weight) -> Option<FontArc> {
    let families: Vec<Family<'_>> = names.iter().map(|name| Family::Name(*name)).collect();
    let id = db.query(&Query {
        families: &families,
        weight,
        stretch: Stretch::Normal,
        style: Style::Normal,
    })?;
    let font = face_data(db, id)?;
    debug!(?weight, "resolved card font");
    Some(font)
}

fn any_face(db: &Database) -> Option<FontArc> {
    let id = db.faces().next()?.id;
    warn!("no preferred font family installed; falling back to the first system face");
    face_data(db, id)
}

fn face_data(db: &Database, id: fontdb::ID) -> Option<FontArc> {
    db.with_face_data(id, |data, index| {
        FontVec::try_from_vec_and_index(data.to_vec(), index)
            .ok()
            .map(FontArc::new)
    })?
}
