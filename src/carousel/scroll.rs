use std::time::Duration;

/// Frame length the easing ratio is calibrated against (60 Hz).
pub const NOMINAL_FRAME: Duration = Duration::from_micros(16_667);

/// Longer gaps (a stalled window, a debugger) are treated as this long so a
/// single frame never jumps all the way to the target.
const MAX_FRAME_GAP: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// Offsets seen by one frame, captured before `last` is rolled forward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollFrame {
    pub current: f32,
    pub last: f32,
    pub direction: Direction,
}

impl ScrollFrame {
    /// Instantaneous scroll speed in world units per frame.
    pub fn speed(&self) -> f32 {
        self.current - self.last
    }
}

/// Current/target/last scroll offsets.
///
/// Input only ever writes `target`; `current` moves exclusively through
/// [`ScrollState::advance`] / [`ScrollState::advance_for`], once per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollState {
    current: f32,
    target: f32,
    last: f32,
    easing: f32,
}

impl ScrollState {
    pub fn new(easing: f32) -> Self {
        Self {
            current: 0.0,
            target: 0.0,
            last: 0.0,
            easing: easing.clamp(f32::EPSILON, 1.0),
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn last(&self) -> f32 {
        self.last
    }

    pub fn easing(&self) -> f32 {
        self.easing
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    pub fn nudge_target(&mut self, delta: f32) {
        self.target += delta;
    }

    /// One nominal frame of easing: `current += (target - current) * easing`.
    pub fn advance(&mut self) -> ScrollFrame {
        self.step(self.easing)
    }

    /// Like [`advance`](Self::advance) but scaled to the real frame length,
    /// so the glide takes the same wall time at 30 Hz and 144 Hz.
    pub fn advance_for(&mut self, elapsed: Duration) -> ScrollFrame {
        let frames = elapsed.min(MAX_FRAME_GAP).as_secs_f32() / NOMINAL_FRAME.as_secs_f32();
        let ratio = 1.0 - (1.0 - self.easing).powf(frames);
        self.step(ratio)
    }

    fn step(&mut self, ratio: f32) -> ScrollFrame {
        self.current = lerp(self.current, self.target, ratio);
        let direction = if self.current > self.last {
            Direction::Right
        } else {
            Direction::Left
        };
        let frame = ScrollFrame {
            current: self.current,
            last: self.last,
            direction,
        };
        self.last = self.current;
        frame
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}
