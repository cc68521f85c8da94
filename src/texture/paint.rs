//! Software painting onto an RGBA bitmap, in logical units scaled by the
//! device pixel ratio.

use std::f32::consts::{FRAC_PI_2, PI};

use image::{GrayImage, Luma, Pixel, Rgba, RgbaImage, imageops};
use lyon::algorithms::hit_test::hit_test_path;
use lyon::math::point;
use lyon::path::path::Builder as PathBuilder;
use lyon::path::{FillRule, Path};

use super::face::{FontRole, TextFace};
use super::style::Color;

const PATH_TOLERANCE: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Vertical anchor of a text run, as in the 2D canvas API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Baseline {
    Top,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Solid(Color),
    /// Linear gradient along the segment `from` -> `to` (logical units).
    Linear {
        from: (f32, f32),
        to: (f32, f32),
        start: Color,
        end: Color,
    },
}

impl Paint {
    pub fn at(&self, x: f32, y: f32) -> Color {
        match *self {
            Paint::Solid(color) => color,
            Paint::Linear {
                from,
                to,
                start,
                end,
            } => {
                let (dx, dy) = (to.0 - from.0, to.1 - from.1);
                let len2 = dx * dx + dy * dy;
                let t = if len2 > 0.0 {
                    (((x - from.0) * dx + (y - from.1) * dy) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                mix(start, end, t)
            }
        }
    }
}

/// A text run to place on the canvas.
#[derive(Debug, Clone, Copy)]
pub struct TextRun<'a> {
    pub role: FontRole,
    pub px: f32,
    pub text: &'a str,
    pub x: f32,
    pub y: f32,
    pub align: Align,
    pub baseline: Baseline,
}

/// Blurred offset copy drawn underneath a text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub color: Color,
    pub offset: (f32, f32),
    pub blur: f32,
}

pub struct Canvas {
    image: RgbaImage,
    scale: f32,
}

impl Canvas {
    pub fn new(width: f32, height: f32, scale: f32) -> Self {
        let scale = scale.max(0.1);
        let w = (width * scale).round().max(1.0) as u32;
        let h = (height * scale).round().max(1.0) as u32;
        Self {
            image: RgbaImage::new(w, h),
            scale,
        }
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Source-over blend of `color` at `coverage` into one device pixel.
    pub fn blend(&mut self, x: i32, y: i32, color: Color, coverage: f32) {
        if x < 0 || y < 0 || x as u32 >= self.image.width() || y as u32 >= self.image.height() {
            return;
        }
        let alpha = to_byte(color[3] * coverage);
        if alpha == 0 {
            return;
        }
        let src = Rgba([to_byte(color[0]), to_byte(color[1]), to_byte(color[2]), alpha]);
        self.image.get_pixel_mut(x as u32, y as u32).blend(&src);
    }

    /// Fills the whole canvas as a rounded rectangle, with antialiased corners.
    pub fn fill_rounded_rect(&mut self, radius: f32, paint: Paint) {
        let (w, h) = self.logical_size();
        self.for_each_pixel(|canvas, px, py, lx, ly| {
            let d = rounded_rect_sdf(lx, ly, w, h, radius);
            let coverage = (0.5 - d * canvas.scale).clamp(0.0, 1.0);
            canvas.blend(px, py, paint.at(lx, ly), coverage);
        });
    }

    /// Strokes the outline of the canvas-sized rounded rectangle, centred on
    /// the edge, so half the line falls outside the bitmap.
    pub fn stroke_rounded_rect(&mut self, radius: f32, line_width: f32, color: Color) {
        let (w, h) = self.logical_size();
        let half = line_width * self.scale / 2.0;
        self.for_each_pixel(|canvas, px, py, lx, ly| {
            let d = rounded_rect_sdf(lx, ly, w, h, radius).abs() * canvas.scale;
            let coverage = (half + 0.5 - d).clamp(0.0, 1.0);
            canvas.blend(px, py, color, coverage);
        });
    }

    /// Fills a path given in logical units, using 2x2 supersampled
    /// hit-testing for coverage.
    pub fn fill_path(&mut self, path: &Path, bounds: ((f32, f32), (f32, f32)), color: Color) {
        let s = self.scale;
        let x0 = (bounds.0.0 * s).floor() as i32;
        let y0 = (bounds.0.1 * s).floor() as i32;
        let x1 = (bounds.1.0 * s).ceil() as i32;
        let y1 = (bounds.1.1 * s).ceil() as i32;
        for py in y0..y1 {
            for px in x0..x1 {
                let mut hits = 0u8;
                for (sx, sy) in [(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)] {
                    let sample = point((px as f32 + sx) / s, (py as f32 + sy) / s);
                    if hit_test_path(&sample, path.iter(), FillRule::EvenOdd, PATH_TOLERANCE) {
                        hits += 1;
                    }
                }
                if hits > 0 {
                    self.blend(px, py, color, f32::from(hits) / 4.0);
                }
            }
        }
    }

    /// Draws a run of text and returns its measured width in logical units.
    pub fn draw_text(
        &mut self,
        face: &dyn TextFace,
        run: TextRun<'_>,
        paint: Paint,
        shadow: Option<Shadow>,
    ) -> f32 {
        let s = self.scale;
        let px = run.px * s;
        let width = face.measure(run.role, px, run.text);
        let left = match run.align {
            Align::Left => run.x * s,
            Align::Center => run.x * s - width / 2.0,
            Align::Right => run.x * s - width,
        };
        let baseline = match run.baseline {
            Baseline::Top => run.y * s + face.ascent(run.role, px),
            Baseline::Middle => {
                run.y * s + (face.ascent(run.role, px) + face.descent(run.role, px)) / 2.0
            }
        };

        if let Some(shadow) = shadow {
            let origin = (left + shadow.offset.0 * s, baseline + shadow.offset.1 * s);
            let mut mask = GrayImage::new(self.image.width(), self.image.height());
            face.rasterize(run.role, px, run.text, origin, &mut |x, y, c| {
                add_coverage(&mut mask, x, y, c)
            });
            // Canvas shadow blur is roughly twice the gaussian sigma.
            let sigma = shadow.blur * s / 2.0;
            if sigma > 0.0 {
                mask = imageops::blur(&mask, sigma);
            }
            self.composite(&mask, shadow.color);
        }

        face.rasterize(run.role, px, run.text, (left, baseline), &mut |x, y, coverage| {
            let color = paint.at((x as f32 + 0.5) / s, (y as f32 + 0.5) / s);
            self.blend(x, y, color, coverage);
        });
        width / s
    }

    /// Paints `color` through a coverage mask the size of the canvas.
    fn composite(&mut self, mask: &GrayImage, color: Color) {
        for (x, y, Luma([value])) in mask.enumerate_pixels() {
            if *value > 0 {
                self.blend(x as i32, y as i32, color, f32::from(*value) / 255.0);
            }
        }
    }

    fn logical_size(&self) -> (f32, f32) {
        (
            self.image.width() as f32 / self.scale,
            self.image.height() as f32 / self.scale,
        )
    }

    fn for_each_pixel(&mut self, mut f: impl FnMut(&mut Self, i32, i32, f32, f32)) {
        let (w, h) = (self.image.width() as i32, self.image.height() as i32);
        for py in 0..h {
            for px in 0..w {
                let lx = (px as f32 + 0.5) / self.scale;
                let ly = (py as f32 + 0.5) / self.scale;
                f(self, px, py, lx, ly);
            }
        }
    }
}

fn add_coverage(mask: &mut GrayImage, x: i32, y: i32, coverage: f32) {
    if x < 0 || y < 0 || x as u32 >= mask.width() || y as u32 >= mask.height() {
        return;
    }
    let Luma([value]) = mask.get_pixel_mut(x as u32, y as u32);
    *value = value.saturating_add(to_byte(coverage));
}

/// Five-pointed star centred on `center`, point up. `outline` > 0 cuts a
/// hollow interior, leaving a band roughly that thick.
pub fn star_path(center: (f32, f32), outer_radius: f32, outline: f32) -> Path {
    let mut builder = Path::builder();
    add_star(&mut builder, center, outer_radius);
    if outline > 0.0 && outline < outer_radius {
        add_star(&mut builder, center, outer_radius - outline * 2.0);
    }
    builder.build()
}

fn add_star(builder: &mut PathBuilder, center: (f32, f32), outer_radius: f32) {
    // Ratio of a regular pentagram's inner and outer vertices.
    let inner_radius = outer_radius * 0.382;
    for i in 0..10 {
        let angle = -FRAC_PI_2 + i as f32 * PI / 5.0;
        let r = if i % 2 == 0 { outer_radius } else { inner_radius };
        let p = point(center.0 + r * angle.cos(), center.1 + r * angle.sin());
        if i == 0 {
            builder.begin(p);
        } else {
            builder.line_to(p);
        }
    }
    builder.close();
}

/// Signed distance from (x, y) to the rounded rectangle `0..w x 0..h`;
/// negative inside.
pub fn rounded_rect_sdf(x: f32, y: f32, w: f32, h: f32, radius: f32) -> f32 {
    let r = radius.min(w / 2.0).min(h / 2.0).max(0.0);
    let qx = (x - w / 2.0).abs() - (w / 2.0 - r);
    let qy = (y - h / 2.0).abs() - (h / 2.0 - r);
    let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
    outside + qx.max(qy).min(0.0) - r
}

pub fn mix(a: Color, b: Color, t: f32) -> Color {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ]
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
