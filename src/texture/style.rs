use tracing::warn;

use crate::config::{CardColors, CardOptions};

/// Straight-alpha sRGB colour, each channel in 0..=1.
pub type Color = [f32; 4];

/// Resolved layout and colours of a card bitmap, in logical pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct CardStyle {
    pub width: f32,
    pub height: f32,
    pub corner_radius: f32,
    pub border_width: f32,

    pub title_px: f32,
    pub title_y: f32,
    pub title_shadow_offset: (f32, f32),

    pub star_size: f32,
    pub star_spacing: f32,
    pub star_y: f32,

    pub quote_px: f32,
    pub quote_inset: f32,
    pub open_quote_y: f32,

    pub body_px: f32,
    pub body_x: f32,
    pub body_top: f32,
    pub line_height: f32,
    pub max_lines: usize,

    pub background_start: Color,
    pub background_end: Color,
    pub border: Color,
    pub title_start: Color,
    pub title_end: Color,
    pub title_shadow: Color,
    pub star_filled: Color,
    pub star_empty: Color,
    pub quote: Color,
    pub body: Color,
}

impl CardStyle {
    pub fn resolve(options: &CardOptions) -> Self {
        let colors = &options.colors;
        let defaults = CardColors::default();
        let pick = |value: &str, fallback: &str, name: &str| -> Color {
            parse_hex_color(value).unwrap_or_else(|| {
                warn!(value, name, "unparseable card colour; using default");
                parse_hex_color(fallback).unwrap_or([1.0, 1.0, 1.0, 1.0])
            })
        };
        Self {
            width: options.width as f32,
            height: options.height as f32,
            corner_radius: options.corner_radius,
            border_width: 1.0,
            title_px: 42.0,
            title_y: 65.0,
            title_shadow_offset: (2.0, 2.0),
            star_size: 32.0,
            star_spacing: 38.0,
            star_y: 125.0,
            quote_px: 48.0,
            quote_inset: 30.0,
            open_quote_y: 180.0,
            body_px: 32.0,
            body_x: 50.0,
            body_top: 200.0,
            line_height: 38.0,
            max_lines: options.max_lines,
            background_start: pick(
                &colors.background_start,
                &defaults.background_start,
                "background-start",
            ),
            background_end: pick(
                &colors.background_end,
                &defaults.background_end,
                "background-end",
            ),
            border: pick(&colors.border, &defaults.border, "border"),
            title_start: pick(&colors.title_start, &defaults.title_start, "title-start"),
            title_end: pick(&colors.title_end, &defaults.title_end, "title-end"),
            title_shadow: pick(&colors.title_shadow, &defaults.title_shadow, "title-shadow"),
            star_filled: pick(&colors.star_filled, &defaults.star_filled, "star-filled"),
            star_empty: pick(&colors.star_empty, &defaults.star_empty, "star-empty"),
            quote: pick(&colors.quote, &defaults.quote, "quote"),
            body: pick(&colors.body, &defaults.body, "body"),
        }
    }

    /// Widest a body line may be.
    pub fn body_max_width(&self) -> f32 {
        self.width - 2.0 * self.body_x
    }

    /// Centre x of the first star in a row of `count`, with the row centred on
    /// the card.
    pub fn star_row_start(&self, count: u8) -> f32 {
        let count = f32::from(count);
        let row = (count - 1.0).max(0.0) * self.star_spacing + self.star_size;
        (self.width - row) / 2.0
    }

    /// Baseline position of the closing quote, below the last body line.
    pub fn close_quote_y(&self, lines: usize) -> f32 {
        let extra_lines = lines.saturating_sub(1) as f32;
        self.body_top + extra_lines * self.line_height + 20.0
    }
}

/// Parses `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`.
pub fn parse_hex_color(value: &str) -> Option<Color> {
    let hex = value.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let channel = |digits: &str| -> Option<f32> {
        let byte = if digits.len() == 1 {
            u8::from_str_radix(&digits.repeat(2), 16).ok()?
        } else {
            u8::from_str_radix(digits, 16).ok()?
        };
        Some(f32::from(byte) / 255.0)
    };
    let width = match hex.len() {
        3 | 4 => 1,
        6 | 8 => 2,
        _ => return None,
    };
    let mut out = [1.0; 4];
    for (i, slot) in out.iter_mut().enumerate().take(hex.len() / width) {
        *slot = channel(&hex[i * width..(i + 1) * width])?;
    }
    Some(out)
}
