//! The carousel engine: scroll state, input, arc geometry and the doubled
//! track, owned together for one mounted instance.
//!
//! Nothing in here touches the GPU or the window. The viewer feeds it input
//! and a clock, then reads card placements back out for drawing.

pub mod geometry;
pub mod input;
pub mod scroll;
pub mod track;

use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, info};
use winit::dpi::PhysicalSize;

use crate::config::{CameraOptions, Configuration, LayoutOptions};
use crate::events::{CarouselInput, PointerEvent};
use crate::review;
use crate::texture::CardTextureGenerator;

pub use geometry::{Curve, Placement, Viewport, Visibility};
pub use input::{InputDispatcher, Interaction, SnapDebounce, snap_target};
pub use scroll::{Direction, ScrollFrame, ScrollState};
pub use track::{CardItem, CardLayout, Track, card_layout};

pub struct Carousel {
    scroll: ScrollState,
    input: InputDispatcher,
    track: Track,
    viewport: Viewport,
    curve: Curve,
    camera: CameraOptions,
    layout: LayoutOptions,
    last_tick: Option<Instant>,
    torn_down: bool,
}

impl Carousel {
    /// Builds the track for `cfg.reviews` (or the built-in reviews when none
    /// are configured), rendering every card texture once.
    pub fn new(
        cfg: &Configuration,
        size: PhysicalSize<u32>,
        generator: &mut CardTextureGenerator,
        rng: &mut impl Rng,
    ) -> Self {
        let reviews = review::with_fallback(&cfg.reviews);
        let viewport = viewport_for(size, &cfg.camera);
        let layout = card_layout(&viewport, &cfg.layout);
        let track = Track::build(&reviews, layout, generator, rng);
        info!(
            cards = track.len(),
            bend = cfg.bend,
            slot_width = layout.slot_width,
            snap_debounce = %humantime::format_duration(cfg.scroll.snap_debounce),
            "carousel mounted"
        );
        Self {
            scroll: ScrollState::new(cfg.scroll.easing),
            input: InputDispatcher::new(&cfg.scroll),
            track,
            viewport,
            curve: Curve::new(cfg.bend),
            camera: cfg.camera.clone(),
            layout: cfg.layout.clone(),
            last_tick: None,
            torn_down: false,
        }
    }

    /// Recomputes the viewport and card sizing. Zero-sized windows (minimised)
    /// are ignored and the previous layout is kept.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            debug!(?size, "ignoring zero-sized resize");
            return;
        }
        self.viewport = viewport_for(size, &self.camera);
        let layout = card_layout(&self.viewport, &self.layout);
        self.track.resize(layout);
        debug!(
            width = size.width,
            height = size.height,
            slot_width = layout.slot_width,
            cycle_width = self.track.cycle_width(),
            "carousel resized"
        );
    }

    pub fn handle(&mut self, event: CarouselInput, now: Instant) {
        match event {
            CarouselInput::Pointer(pointer) => self.pointer(pointer),
            CarouselInput::Wheel(wheel) => self.wheel(wheel.delta_y, now),
        }
    }

    pub fn pointer(&mut self, event: PointerEvent) {
        if self.torn_down {
            return;
        }
        match event {
            PointerEvent::Down { x } => self.input.pointer_down(x, &self.scroll),
            PointerEvent::Move { x } => self.input.pointer_move(x, &mut self.scroll),
            PointerEvent::Up => {
                let slot = self.snap_width();
                self.input.pointer_up(&mut self.scroll, slot);
            }
        }
    }

    pub fn wheel(&mut self, delta_y: f32, now: Instant) {
        if self.torn_down {
            return;
        }
        self.input.wheel(delta_y, &mut self.scroll, now);
    }

    /// Advances one frame using the wall time since the previous tick.
    pub fn tick(&mut self, now: Instant) -> Option<ScrollFrame> {
        let elapsed = self
            .last_tick
            .map_or(scroll::NOMINAL_FRAME, |last| now.saturating_duration_since(last));
        self.tick_with(now, elapsed)
    }

    /// Advances one frame of `elapsed` length: fires a due wheel snap, eases
    /// the scroll offset and repositions every card.
    pub fn tick_with(&mut self, now: Instant, elapsed: Duration) -> Option<ScrollFrame> {
        if self.torn_down {
            return None;
        }
        self.last_tick = Some(now);
        let slot = self.snap_width();
        self.input.poll(now, &mut self.scroll, slot);
        let frame = self.scroll.advance_for(elapsed);
        self.track
            .update(&frame, &self.curve, self.viewport.half_width());
        Some(frame)
    }

    /// Cancels the pending snap and stops reacting to input and ticks.
    /// Safe to call more than once.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.input.cancel();
        self.torn_down = true;
        debug!("carousel input detached");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn interaction(&self) -> Interaction {
        self.input.interaction()
    }

    pub fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn items(&self) -> &[CardItem] {
        self.track.items()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn curve(&self) -> Curve {
        self.curve
    }

    pub fn camera(&self) -> &CameraOptions {
        &self.camera
    }

    fn snap_width(&self) -> Option<f32> {
        (!self.track.is_empty()).then(|| self.track.slot_width())
    }
}

fn viewport_for(size: PhysicalSize<u32>, camera: &CameraOptions) -> Viewport {
    let width = size.width.max(1) as f32;
    let height = size.height.max(1) as f32;
    Viewport::from_camera(width, height, camera.fov_degrees, camera.distance)
}
