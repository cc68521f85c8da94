use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use review_carousel::carousel::geometry::Viewport;
use review_carousel::carousel::{
    Carousel, Curve, Interaction, ScrollState, Track, card_layout,
};
use review_carousel::config::{CardOptions, Configuration, LayoutOptions};
use review_carousel::events::{CarouselInput, PointerEvent, WheelEvent};
use review_carousel::review::{ReviewRecord, default_reviews};
use review_carousel::texture::CardTextureGenerator;
use review_carousel::texture::testkit::BlockFace;
use winit::dpi::PhysicalSize;

const EPS: f32 = 1e-3;

fn generator() -> CardTextureGenerator {
    // Small bitmaps keep the suite quick; size does not affect placement.
    CardTextureGenerator::new(&CardOptions::default(), 0.25, Box::new(BlockFace))
}

fn mount(cfg: &Configuration) -> (Carousel, CardTextureGenerator) {
    let mut generator = generator();
    let mut rng = StdRng::seed_from_u64(42);
    let carousel = Carousel::new(cfg, PhysicalSize::new(1280, 550), &mut generator, &mut rng);
    (carousel, generator)
}

struct Rig {
    track: Track,
    scroll: ScrollState,
    curve: Curve,
    half_width: f32,
}

impl Rig {
    fn new(bend: f32) -> Self {
        let viewport = Viewport::from_camera(1280.0, 550.0, 45.0, 20.0);
        let layout = card_layout(&viewport, &LayoutOptions::default());
        let mut rng = StdRng::seed_from_u64(3);
        let track = Track::build(&default_reviews(), layout, &mut generator(), &mut rng);
        Self {
            track,
            // Full easing lands exactly on the target each frame.
            scroll: ScrollState::new(1.0),
            curve: Curve::new(bend),
            half_width: viewport.half_width(),
        }
    }

    /// Scrolls right by `distance` in steps no wider than half a slot.
    fn scroll_by(&mut self, distance: f32) {
        let start = self.scroll.target();
        let end = start + distance;
        let step = self.track.slot_width() / 2.0;
        let mut target = start;
        loop {
            target = (target + step).min(end);
            self.scroll.set_target(target);
            let frame = self.scroll.advance();
            self.track.update(&frame, &self.curve, self.half_width);
            if target >= end {
                break;
            }
        }
    }

    fn placements(&self) -> Vec<(f32, f32, f32)> {
        self.track
            .items()
            .iter()
            .map(|item| (item.x, item.y, item.rotation))
            .collect()
    }

    fn arrangement(&self) -> Vec<(f32, usize)> {
        let mut cards: Vec<(f32, usize)> = self
            .track
            .items()
            .iter()
            .map(|item| (item.x, item.review_index))
            .collect();
        cards.sort_by(|a, b| a.0.total_cmp(&b.0));
        cards
    }
}

#[test]
fn six_reviews_make_a_track_of_twelve() {
    let (carousel, generator) = mount(&Configuration::default());
    assert_eq!(carousel.track().len(), 12);
    assert_eq!(carousel.track().distinct(), 6);
    assert_eq!(generator.generated(), 12);
}

#[test]
fn empty_review_list_falls_back_to_defaults() {
    let cfg = Configuration {
        reviews: Vec::new(),
        ..Configuration::default()
    };
    let (carousel, _) = mount(&cfg);
    assert_eq!(carousel.track().len(), 12);
    assert_eq!(carousel.items()[0].review.company, "Artisan Collective");
}

#[test]
fn custom_reviews_are_doubled() {
    let cfg = Configuration {
        reviews: vec![
            ReviewRecord::new("One", 5, "First."),
            ReviewRecord::new("Two", 3, "Second."),
            ReviewRecord::new("Three", 1, "Third."),
        ],
        ..Configuration::default()
    };
    let (carousel, _) = mount(&cfg);
    let companies: Vec<&str> = carousel
        .items()
        .iter()
        .map(|item| item.review.company.as_str())
        .collect();
    assert_eq!(companies, ["One", "Two", "Three", "One", "Two", "Three"]);
}

#[test]
fn zero_bend_keeps_every_card_level() {
    let cfg = Configuration {
        bend: 0.0,
        ..Configuration::default()
    };
    let (mut carousel, _) = mount(&cfg);
    let now = Instant::now();
    carousel.wheel(1.0, now);
    for i in 0..30 {
        carousel.tick_with(now + Duration::from_millis(16 * i), Duration::from_millis(16));
        for item in carousel.items() {
            assert_eq!(item.y, 0.0);
            assert_eq!(item.rotation, 0.0);
        }
    }
}

#[test]
fn bent_track_lifts_cards_away_from_centre() {
    let (mut carousel, _) = mount(&Configuration::default());
    carousel.tick(Instant::now());
    let half = carousel.viewport().half_width();
    for item in carousel.items() {
        if item.x.abs() > 1.0 && item.x.abs() <= half {
            assert!(item.y < 0.0, "card at {} not dipped", item.x);
            assert!(item.rotation * item.x < 0.0);
        }
    }
}

#[test]
fn scrolling_one_cycle_restores_every_card() {
    let mut rig = Rig::new(1.5);
    let cycle = rig.track.cycle_width();
    rig.scroll_by(cycle);
    let before = rig.placements();

    rig.scroll_by(cycle);
    let after = rig.placements();

    for (i, (a, b)) in before.iter().zip(&after).enumerate() {
        assert!((a.0 - b.0).abs() < EPS, "card {i} x: {} vs {}", a.0, b.0);
        assert!((a.1 - b.1).abs() < EPS, "card {i} y");
        assert!((a.2 - b.2).abs() < EPS, "card {i} rotation");
    }
    for item in rig.track.items() {
        assert!(item.wraps <= -1);
    }
}

#[test]
fn scrolling_one_content_period_shows_the_same_reviews() {
    let mut rig = Rig::new(1.5);
    rig.scroll_by(rig.track.cycle_width());
    let before = rig.arrangement();

    rig.scroll_by(rig.track.content_period());
    let after = rig.arrangement();

    assert_eq!(before.len(), after.len());
    for (a, b) in before.iter().zip(&after) {
        assert!((a.0 - b.0).abs() < EPS, "{} vs {}", a.0, b.0);
        assert_eq!(a.1, b.1);
    }
}

#[test]
fn extra_offset_moves_in_whole_cycles() {
    let mut rig = Rig::new(1.5);
    rig.scroll_by(rig.track.cycle_width() * 2.5);
    let cycle = rig.track.cycle_width();
    for item in rig.track.items() {
        let expected = item.home_x - rig.scroll.current() - item.extra_offset(cycle);
        assert!((item.x - expected).abs() < EPS);
        let laps = item.extra_offset(cycle) / cycle;
        assert!((laps - laps.round()).abs() < 1e-6);
    }
}

#[test]
fn drag_release_snaps_to_a_slot_with_the_same_sign() {
    let (mut carousel, _) = mount(&Configuration::default());
    let now = Instant::now();
    for (down, up) in [(900.0, 123.0), (100.0, 777.0)] {
        carousel.handle(CarouselInput::Pointer(PointerEvent::Down { x: down }), now);
        carousel.handle(CarouselInput::Pointer(PointerEvent::Move { x: up }), now);
        let before = carousel.scroll().target();
        carousel.handle(CarouselInput::Pointer(PointerEvent::Up), now);
        let after = carousel.scroll().target();
        let slot = carousel.track().slot_width();
        let k = after / slot;
        assert!((k - k.round()).abs() < 1e-4, "target {after} not on a slot");
        assert!(before * after >= 0.0);
        for _ in 0..5 {
            carousel.tick(now);
        }
    }
}

#[test]
fn wheel_snap_fires_after_quiet_period() {
    let (mut carousel, _) = mount(&Configuration::default());
    let t0 = Instant::now();
    let frame = Duration::from_millis(16);

    carousel.handle(CarouselInput::Wheel(WheelEvent { delta_y: 4.0 }), t0);
    carousel.handle(
        CarouselInput::Wheel(WheelEvent { delta_y: 4.0 }),
        t0 + Duration::from_millis(120),
    );
    assert_eq!(carousel.scroll().target(), 3.0);

    carousel.tick_with(t0 + Duration::from_millis(250), frame);
    assert_eq!(carousel.interaction(), Interaction::PendingSnap);
    assert_eq!(carousel.scroll().target(), 3.0);

    carousel.tick_with(t0 + Duration::from_millis(330), frame);
    assert_eq!(carousel.interaction(), Interaction::Idle);
    let slot = carousel.track().slot_width();
    let k = carousel.scroll().target() / slot;
    assert!((k - k.round()).abs() < 1e-4);
}

#[test]
fn current_converges_without_moving_target() {
    let (mut carousel, _) = mount(&Configuration::default());
    let now = Instant::now();
    carousel.handle(CarouselInput::Pointer(PointerEvent::Down { x: 600.0 }), now);
    carousel.handle(CarouselInput::Pointer(PointerEvent::Move { x: 300.0 }), now);
    carousel.handle(CarouselInput::Pointer(PointerEvent::Up), now);
    let target = carousel.scroll().target();
    let mut gap = (target - carousel.scroll().current()).abs();
    for i in 1..200 {
        carousel.tick_with(now + Duration::from_millis(16 * i), Duration::from_millis(16));
        let next = (target - carousel.scroll().current()).abs();
        assert!(next <= gap);
        gap = next;
    }
    assert_eq!(carousel.scroll().target(), target);
    assert!(gap < 1e-2);
}

#[test]
fn textures_are_generated_once_across_resizes() {
    let (mut carousel, generator) = mount(&Configuration::default());
    let now = Instant::now();
    for (i, (w, h)) in [(800, 600), (1920, 1080), (0, 0), (640, 360)].into_iter().enumerate() {
        carousel.resize(PhysicalSize::new(w, h));
        carousel.tick_with(now + Duration::from_millis(16 * i as u64), Duration::from_millis(16));
    }
    assert_eq!(generator.generated(), 12);
    assert_eq!(carousel.track().len(), 12);
}

#[test]
fn resize_keeps_card_world_size_and_widens_viewport() {
    let (mut carousel, _) = mount(&Configuration::default());
    let slot = carousel.track().slot_width();
    let half = carousel.viewport().half_width();

    // Card size scales with window height, so in world units it stays put
    // while the visible span follows the aspect ratio.
    carousel.resize(PhysicalSize::new(2560, 550));
    assert!((carousel.track().slot_width() - slot).abs() < EPS);
    assert!((carousel.viewport().half_width() - half * 2.0).abs() < EPS);
    assert!((carousel.track().cycle_width() - slot * 12.0).abs() < EPS);
    assert!((carousel.items()[3].home_x - slot * 3.0).abs() < EPS);
}
