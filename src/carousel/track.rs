use std::sync::Arc;

use rand::Rng;
use tracing::debug;

use super::geometry::{Curve, Viewport, visibility};
use super::scroll::{Direction, ScrollFrame};
use crate::config::LayoutOptions;
use crate::review::ReviewRecord;
use crate::texture::{CardTexture, CardTextureGenerator};

/// Per-frame increment of each card's shader clock.
pub const TIME_STEP: f32 = 0.04;
/// Upper bound of the speed uniform handed to the shader.
pub const MAX_SHADER_SPEED: f32 = 2.0;

/// Card plane size and spacing for the current viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardLayout {
    pub plane_width: f32,
    pub plane_height: f32,
    pub slot_width: f32,
}

/// Scales the reference card size so a card keeps the same share of the
/// window height at any window size.
pub fn card_layout(viewport: &Viewport, options: &LayoutOptions) -> CardLayout {
    let scale = viewport.screen_height / options.reference_height_px;
    let plane_height =
        viewport.world_height * (options.card_height_px * scale) / viewport.screen_height;
    let plane_width =
        viewport.world_width * (options.card_width_px * scale) / viewport.screen_width;
    CardLayout {
        plane_width,
        plane_height,
        slot_width: plane_width + options.padding,
    }
}

/// One slot of the doubled track.
#[derive(Debug, Clone)]
pub struct CardItem {
    pub review: ReviewRecord,
    /// Index into the distinct review list.
    pub review_index: usize,
    /// Position in the doubled track, `0..2N`.
    pub slot: usize,
    pub texture: Arc<CardTexture>,
    pub home_x: f32,
    /// Net number of cycle-width teleports; the extra offset is
    /// `wraps * cycle_width`.
    pub wraps: i32,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub is_before: bool,
    pub is_after: bool,
    pub time: f32,
    pub speed: f32,
    pub plane_width: f32,
    pub plane_height: f32,
}

impl CardItem {
    pub fn extra_offset(&self, cycle_width: f32) -> f32 {
        self.wraps as f32 * cycle_width
    }

    /// Speed as clamped for the shader uniform.
    pub fn shader_speed(&self) -> f32 {
        self.speed.abs().min(MAX_SHADER_SPEED)
    }

    fn place(&mut self, current: f32, cycle_width: f32, curve: &Curve, half_width: f32) {
        self.x = self.home_x - current - self.extra_offset(cycle_width);
        let placement = curve.place(self.x, half_width);
        self.y = placement.y;
        self.rotation = placement.rotation;
    }
}

/// The review list laid out twice in a row.
///
/// Each card texture is rendered once here and shared by reference for the
/// lifetime of the track.
#[derive(Debug, Clone)]
pub struct Track {
    items: Vec<CardItem>,
    distinct: usize,
    layout: CardLayout,
}

impl Track {
    pub fn build(
        reviews: &[ReviewRecord],
        layout: CardLayout,
        generator: &mut CardTextureGenerator,
        rng: &mut impl Rng,
    ) -> Self {
        let distinct = reviews.len();
        let items: Vec<CardItem> = reviews
            .iter()
            .chain(reviews.iter())
            .enumerate()
            .map(|(slot, review)| {
                let texture = Arc::new(generator.render(review));
                CardItem {
                    review: review.clone(),
                    review_index: slot % distinct.max(1),
                    slot,
                    texture,
                    home_x: layout.slot_width * slot as f32,
                    wraps: 0,
                    x: layout.slot_width * slot as f32,
                    y: 0.0,
                    rotation: 0.0,
                    is_before: false,
                    is_after: false,
                    time: 100.0 * rng.random::<f32>(),
                    speed: 0.0,
                    plane_width: layout.plane_width,
                    plane_height: layout.plane_height,
                }
            })
            .collect();
        debug!(distinct, items = items.len(), "track built");
        Self {
            items,
            distinct,
            layout,
        }
    }

    /// Applies a new layout. Wrap counts are kept, so every card stays on the
    /// same lap of the loop.
    pub fn resize(&mut self, layout: CardLayout) {
        self.layout = layout;
        for item in &mut self.items {
            item.plane_width = layout.plane_width;
            item.plane_height = layout.plane_height;
            item.home_x = layout.slot_width * item.slot as f32;
        }
    }

    /// Repositions every card for this frame and teleports the ones that have
    /// fully left the viewport on the trailing side.
    pub fn update(&mut self, frame: &ScrollFrame, curve: &Curve, half_width: f32) {
        let cycle = self.cycle_width();
        let speed = frame.speed();
        for item in &mut self.items {
            item.place(frame.current, cycle, curve, half_width);
            item.speed = speed;
            item.time += TIME_STEP;

            let vis = visibility(item.x, item.plane_width, half_width);
            item.is_before = vis.is_before;
            item.is_after = vis.is_after;

            let wrapped = match frame.direction {
                Direction::Right if item.is_before => {
                    item.wraps -= 1;
                    true
                }
                Direction::Left if item.is_after => {
                    item.wraps += 1;
                    true
                }
                _ => false,
            };
            if wrapped {
                item.is_before = false;
                item.is_after = false;
                item.place(frame.current, cycle, curve, half_width);
            }
        }
    }

    pub fn items(&self) -> &[CardItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct reviews (half the track length).
    pub fn distinct(&self) -> usize {
        self.distinct
    }

    pub fn layout(&self) -> CardLayout {
        self.layout
    }

    pub fn slot_width(&self) -> f32 {
        self.layout.slot_width
    }

    /// Teleport distance: the width of the whole doubled track.
    pub fn cycle_width(&self) -> f32 {
        self.layout.slot_width * self.items.len() as f32
    }

    /// Scroll distance after which every screen slot shows the same review again.
    pub fn content_period(&self) -> f32 {
        self.layout.slot_width * self.distinct as f32
    }
}
