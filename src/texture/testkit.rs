//! Font-free glyph face for tests and machines without system fonts.

use super::face::{FontRole, TextFace};

/// Every character is half an em wide; visible characters are drawn as
/// solid boxes from the baseline up to 70% of the em.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockFace;

impl BlockFace {
    fn advance(px: f32) -> f32 {
        px * 0.5
    }
}

impl TextFace for BlockFace {
    fn measure(&self, _role: FontRole, px: f32, text: &str) -> f32 {
        text.chars().count() as f32 * Self::advance(px)
    }

    fn ascent(&self, _role: FontRole, px: f32) -> f32 {
        px * 0.8
    }

    fn descent(&self, _role: FontRole, px: f32) -> f32 {
        -px * 0.2
    }

    fn rasterize(
        &self,
        _role: FontRole,
        px: f32,
        text: &str,
        origin: (f32, f32),
        plot: &mut dyn FnMut(i32, i32, f32),
    ) {
        let advance = Self::advance(px);
        let top = (origin.1 - px * 0.7).round() as i32;
        let bottom = origin.1.round() as i32;
        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let cell = origin.0 + i as f32 * advance;
            let left = (cell + advance * 0.1).round() as i32;
            let right = (cell + advance * 0.9).round() as i32;
            for y in top..bottom {
                for x in left..right {
                    plot(x, y, 1.0);
                }
            }
        }
    }
}
