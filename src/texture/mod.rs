//! Procedural card bitmaps: one review in, one RGBA image out.

pub mod face;
pub mod paint;
pub mod style;
pub mod testkit;
pub mod wrap;

use std::path::Path;

use image::RgbaImage;
use tracing::debug;

use crate::config::CardOptions;
use crate::error::Result;
use crate::review::{MAX_RATING, ReviewRecord};

pub use face::{FontFace, FontRole, TextFace};
pub use style::{CardStyle, Color, parse_hex_color};
pub use wrap::wrap_text;

use paint::{Align, Baseline, Canvas, Paint, Shadow, TextRun};

const TITLE_SHADOW_BLUR: f32 = 4.0;
const STAR_OUTLINE: f32 = 2.0;
const QUOTE_MARK: &str = "\"";

/// Immutable bitmap for one card, in device pixels.
#[derive(Debug, Clone)]
pub struct CardTexture {
    image: RgbaImage,
}

impl CardTexture {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        self.image
            .save_with_format(path.as_ref(), image::ImageFormat::Png)?;
        Ok(())
    }
}

/// Paints card bitmaps at a fixed device pixel ratio and counts how many it
/// has produced.
pub struct CardTextureGenerator {
    style: CardStyle,
    scale_factor: f32,
    face: Box<dyn TextFace>,
    generated: usize,
}

impl CardTextureGenerator {
    pub fn new(options: &CardOptions, scale_factor: f32, face: Box<dyn TextFace>) -> Self {
        Self {
            style: CardStyle::resolve(options),
            scale_factor: scale_factor.max(0.1),
            face,
            generated: 0,
        }
    }

    pub fn style(&self) -> &CardStyle {
        &self.style
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    /// Number of bitmaps rendered so far.
    pub fn generated(&self) -> usize {
        self.generated
    }

    /// Body lines exactly as they will be painted.
    pub fn body_lines(&self, text: &str) -> Vec<String> {
        let px = self.style.body_px;
        wrap_text(text, self.style.body_max_width(), self.style.max_lines, |line| {
            self.face.measure(FontRole::Body, px, line)
        })
    }

    /// Measured width of one body line in logical pixels.
    pub fn measure_body(&self, line: &str) -> f32 {
        self.face.measure(FontRole::Body, self.style.body_px, line)
    }

    pub fn render(&mut self, review: &ReviewRecord) -> CardTexture {
        let style = &self.style;
        let face = self.face.as_ref();
        let mut canvas = Canvas::new(style.width, style.height, self.scale_factor);

        canvas.fill_rounded_rect(
            style.corner_radius,
            Paint::Linear {
                from: (0.0, 0.0),
                to: (style.width, style.height),
                start: style.background_start,
                end: style.background_end,
            },
        );
        canvas.stroke_rounded_rect(style.corner_radius, style.border_width, style.border);

        canvas.draw_text(
            face,
            TextRun {
                role: FontRole::Title,
                px: style.title_px,
                text: &review.company,
                x: style.width / 2.0,
                y: style.title_y,
                align: Align::Center,
                baseline: Baseline::Middle,
            },
            Paint::Linear {
                from: (0.0, 0.0),
                to: (style.width, 0.0),
                start: style.title_start,
                end: style.title_end,
            },
            Some(Shadow {
                color: style.title_shadow,
                offset: style.title_shadow_offset,
                blur: TITLE_SHADOW_BLUR,
            }),
        );

        let filled = review.filled_stars();
        let first = style.star_row_start(MAX_RATING);
        let radius = style.star_size * 0.45;
        for i in 0..MAX_RATING {
            let cx = first + f32::from(i) * style.star_spacing;
            let (color, outline) = if i < filled {
                (style.star_filled, 0.0)
            } else {
                (style.star_empty, STAR_OUTLINE)
            };
            let path = paint::star_path((cx, style.star_y), radius, outline);
            let bounds = (
                (cx - radius, style.star_y - radius),
                (cx + radius, style.star_y + radius),
            );
            canvas.fill_path(&path, bounds, color);
        }

        let quote_paint = Paint::Solid(style.quote);
        canvas.draw_text(
            face,
            TextRun {
                role: FontRole::Quote,
                px: style.quote_px,
                text: QUOTE_MARK,
                x: style.quote_inset,
                y: style.open_quote_y,
                align: Align::Left,
                baseline: Baseline::Middle,
            },
            quote_paint,
            None,
        );

        let lines = wrap_text(
            &review.text,
            style.body_max_width(),
            style.max_lines,
            |line| face.measure(FontRole::Body, style.body_px, line),
        );
        for (i, line) in lines.iter().enumerate() {
            canvas.draw_text(
                face,
                TextRun {
                    role: FontRole::Body,
                    px: style.body_px,
                    text: line,
                    x: style.body_x,
                    y: style.body_top + i as f32 * style.line_height,
                    align: Align::Left,
                    baseline: Baseline::Top,
                },
                Paint::Solid(style.body),
                None,
            );
        }

        canvas.draw_text(
            face,
            TextRun {
                role: FontRole::Quote,
                px: style.quote_px,
                text: QUOTE_MARK,
                x: style.width - style.quote_inset,
                y: style.close_quote_y(lines.len()),
                align: Align::Right,
                baseline: Baseline::Top,
            },
            quote_paint,
            None,
        );

        self.generated += 1;
        let texture = CardTexture {
            image: canvas.into_image(),
        };
        debug!(
            company = %review.company,
            lines = lines.len(),
            width = texture.width(),
            height = texture.height(),
            "card texture generated"
        );
        texture
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::testkit::BlockFace;

    #[test]
    fn bitmap_size_follows_scale_factor() {
        let mut generator =
            CardTextureGenerator::new(&CardOptions::default(), 2.0, Box::new(BlockFace));
        let texture = generator.render(&ReviewRecord::new("Acme", 3, "Solid work."));
        assert_eq!((texture.width(), texture.height()), (1400, 900));
        assert_eq!(texture.pixels().len(), 1400 * 900 * 4);
        assert_eq!(generator.generated(), 1);
    }

    #[test]
    fn corners_stay_transparent_and_centre_is_opaque() {
        let mut generator =
            CardTextureGenerator::new(&CardOptions::default(), 1.0, Box::new(BlockFace));
        let texture = generator.render(&ReviewRecord::new("Acme", 5, "Solid work."));
        let image = texture.image();
        assert_eq!(image.get_pixel(0, 0)[3], 0);
        assert_eq!(image.get_pixel(350, 420)[3], 255);
    }

    #[test]
    fn empty_stars_differ_from_filled() {
        let options = CardOptions::default();
        let mut generator = CardTextureGenerator::new(&options, 1.0, Box::new(BlockFace));
        let five = generator.render(&ReviewRecord::new("Acme", 5, "x"));
        let zero = generator.render(&ReviewRecord::new("Acme", 0, "x"));
        let style = generator.style();
        let cx = style.star_row_start(MAX_RATING).round() as u32;
        let cy = style.star_y.round() as u32;
        assert_ne!(five.image().get_pixel(cx, cy), zero.image().get_pixel(cx, cy));
    }
}
