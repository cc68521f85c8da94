use std::time::{Duration, Instant};

use tracing::trace;

use super::scroll::ScrollState;
use crate::config::ScrollOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Idle,
    Dragging,
    PendingSnap,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragAnchor {
    pointer_x: f32,
    offset: f32,
}

/// Cancel-and-restart timer for the wheel snap.
///
/// Owned by the carousel and polled from the frame loop, so firing happens on
/// the same thread as every other state change.
#[derive(Debug, Clone)]
pub struct SnapDebounce {
    wait: Duration,
    deadline: Option<Instant>,
}

impl SnapDebounce {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            deadline: None,
        }
    }

    /// Drops any pending deadline and arms a fresh one `wait` after `now`.
    pub fn restart(&mut self, now: Instant) {
        self.deadline = Some(now + self.wait);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true exactly once per armed deadline, when `now` has reached it.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Rounds `target` to the nearest multiple of `slot_width`, keeping its sign.
///
/// Release velocity is ignored: a fast flick rests on whichever
/// card boundary is nearest to where the target already is.
pub fn snap_target(target: f32, slot_width: f32) -> f32 {
    if !(slot_width > 0.0) {
        return target;
    }
    let index = (target.abs() / slot_width).round();
    let aligned = index * slot_width;
    if target < 0.0 { -aligned } else { aligned }
}

/// Turns pointer and wheel input into scroll-target changes.
#[derive(Debug, Clone)]
pub struct InputDispatcher {
    sensitivity: f32,
    wheel_step: f32,
    drag: Option<DragAnchor>,
    debounce: SnapDebounce,
}

impl InputDispatcher {
    pub fn new(options: &ScrollOptions) -> Self {
        Self {
            sensitivity: options.drag_sensitivity,
            wheel_step: options.wheel_step,
            drag: None,
            debounce: SnapDebounce::new(options.snap_debounce),
        }
    }

    pub fn interaction(&self) -> Interaction {
        if self.drag.is_some() {
            Interaction::Dragging
        } else if self.debounce.is_armed() {
            Interaction::PendingSnap
        } else {
            Interaction::Idle
        }
    }

    pub fn debounce(&self) -> &SnapDebounce {
        &self.debounce
    }

    pub fn pointer_down(&mut self, pointer_x: f32, scroll: &ScrollState) {
        // The release snap supersedes any wheel snap still waiting to fire.
        self.debounce.cancel();
        self.drag = Some(DragAnchor {
            pointer_x,
            offset: scroll.current(),
        });
        trace!(pointer_x, offset = scroll.current(), "drag started");
    }

    pub fn pointer_move(&mut self, pointer_x: f32, scroll: &mut ScrollState) {
        let Some(anchor) = self.drag else {
            return;
        };
        let distance = (anchor.pointer_x - pointer_x) * self.sensitivity;
        scroll.set_target(anchor.offset + distance);
    }

    pub fn pointer_up(&mut self, scroll: &mut ScrollState, slot_width: Option<f32>) {
        if self.drag.take().is_none() {
            return;
        }
        snap(scroll, slot_width);
        trace!(target = scroll.target(), "drag released");
    }

    pub fn wheel(&mut self, delta_y: f32, scroll: &mut ScrollState, now: Instant) {
        if delta_y == 0.0 {
            return;
        }
        let step = if delta_y > 0.0 {
            self.wheel_step
        } else {
            -self.wheel_step
        };
        scroll.nudge_target(step);
        self.debounce.restart(now);
    }

    /// Applies the debounced wheel snap once its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant, scroll: &mut ScrollState, slot_width: Option<f32>) -> bool {
        if !self.debounce.fire_if_due(now) {
            return false;
        }
        snap(scroll, slot_width);
        trace!(target = scroll.target(), "wheel snap applied");
        true
    }

    /// Forgets any drag in progress and disarms the snap timer.
    pub fn cancel(&mut self) {
        self.drag = None;
        self.debounce.cancel();
    }
}

fn snap(scroll: &mut ScrollState, slot_width: Option<f32>) {
    if let Some(width) = slot_width {
        scroll.set_target(snap_target(scroll.target(), width));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ScrollOptions {
        ScrollOptions::default()
    }

    #[test]
    fn snap_rounds_to_nearest_slot_keeping_sign() {
        assert_eq!(snap_target(4.0, 3.0), 3.0);
        assert_eq!(snap_target(4.6, 3.0), 6.0);
        assert_eq!(snap_target(-4.6, 3.0), -6.0);
        assert_eq!(snap_target(-1.0, 3.0), -0.0);
        assert_eq!(snap_target(7.0, 0.0), 7.0);
    }

    #[test]
    fn drag_moves_target_from_anchor() {
        let mut input = InputDispatcher::new(&options());
        let mut scroll = ScrollState::new(0.08);
        scroll.set_target(2.0);
        scroll.advance();
        let anchor = scroll.current();

        input.pointer_down(500.0, &scroll);
        assert_eq!(input.interaction(), Interaction::Dragging);
        input.pointer_move(400.0, &mut scroll);
        assert!((scroll.target() - (anchor + 4.0)).abs() < 1e-5);
        // current is left alone until the next frame
        assert_eq!(scroll.current(), anchor);
    }

    #[test]
    fn move_without_press_is_ignored() {
        let mut input = InputDispatcher::new(&options());
        let mut scroll = ScrollState::new(0.08);
        input.pointer_move(10.0, &mut scroll);
        assert_eq!(scroll.target(), 0.0);
        assert_eq!(input.interaction(), Interaction::Idle);
    }

    #[test]
    fn release_snaps_immediately() {
        let mut input = InputDispatcher::new(&options());
        let mut scroll = ScrollState::new(0.08);
        input.pointer_down(300.0, &scroll);
        input.pointer_move(100.0, &mut scroll); // target = 8.0
        input.pointer_up(&mut scroll, Some(3.0));
        assert_eq!(scroll.target(), 9.0);
        assert_eq!(input.interaction(), Interaction::Idle);
    }

    #[test]
    fn wheel_snap_waits_for_quiet_period() {
        let mut input = InputDispatcher::new(&options());
        let mut scroll = ScrollState::new(0.08);
        let t0 = Instant::now();

        input.wheel(1.0, &mut scroll, t0);
        assert_eq!(scroll.target(), 1.5);
        assert_eq!(input.interaction(), Interaction::PendingSnap);

        // A second notch 150ms later pushes the deadline out.
        input.wheel(1.0, &mut scroll, t0 + Duration::from_millis(150));
        assert!(!input.poll(t0 + Duration::from_millis(250), &mut scroll, Some(2.0)));
        assert_eq!(scroll.target(), 3.0);

        assert!(input.poll(t0 + Duration::from_millis(350), &mut scroll, Some(2.0)));
        assert_eq!(scroll.target(), 4.0);
        assert_eq!(input.interaction(), Interaction::Idle);
        assert!(!input.poll(t0 + Duration::from_millis(400), &mut scroll, Some(2.0)));
    }

    #[test]
    fn press_cancels_pending_wheel_snap() {
        let mut input = InputDispatcher::new(&options());
        let mut scroll = ScrollState::new(0.08);
        let t0 = Instant::now();
        input.wheel(-1.0, &mut scroll, t0);
        input.pointer_down(0.0, &scroll);
        assert!(!input.debounce().is_armed());
        assert!(!input.poll(t0 + Duration::from_secs(1), &mut scroll, Some(2.0)));
        assert_eq!(scroll.target(), -1.5);
    }
}
