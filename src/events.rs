//! Host input normalised into carousel events.
//!
//! Mouse, touch and pen input all collapse into [`PointerEvent`] so the drag
//! logic never needs to know which device produced it. Coordinates are
//! logical pixels.

use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f32 },
    Move { x: f32 },
    Up,
}

/// Wheel input in browser convention: positive `delta_y` scrolls down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    pub delta_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CarouselInput {
    Pointer(PointerEvent),
    Wheel(WheelEvent),
}

/// Tracks the bits of winit state needed to turn window events into
/// [`CarouselInput`]: the last cursor position (button events carry none)
/// and the touch that started the current drag.
#[derive(Debug)]
pub struct InputTranslator {
    scale_factor: f64,
    cursor_x: Option<f32>,
    active_touch: Option<u64>,
}

impl InputTranslator {
    pub fn new(scale_factor: f64) -> Self {
        Self {
            scale_factor: scale_factor.max(0.1),
            cursor_x: None,
            active_touch: None,
        }
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = scale_factor.max(0.1);
    }

    pub fn translate(&mut self, event: &WindowEvent) -> Option<CarouselInput> {
        match event {
            WindowEvent::CursorMoved { position, .. } => self.cursor_moved(*position),
            WindowEvent::CursorLeft { .. } => {
                self.cursor_x = None;
                None
            }
            WindowEvent::MouseInput { state, button, .. } => self.mouse_button(*state, *button),
            WindowEvent::Touch(touch) => self.touch(touch.phase, touch.id, touch.location),
            WindowEvent::MouseWheel { delta, .. } => self.wheel(*delta),
            _ => None,
        }
    }

    pub fn cursor_moved(&mut self, position: PhysicalPosition<f64>) -> Option<CarouselInput> {
        let x = self.to_logical(position.x);
        self.cursor_x = Some(x);
        Some(CarouselInput::Pointer(PointerEvent::Move { x }))
    }

    pub fn mouse_button(&mut self, state: ElementState, button: MouseButton) -> Option<CarouselInput> {
        if button != MouseButton::Left {
            return None;
        }
        match state {
            ElementState::Pressed => {
                let x = self.cursor_x?;
                Some(CarouselInput::Pointer(PointerEvent::Down { x }))
            }
            ElementState::Released => Some(CarouselInput::Pointer(PointerEvent::Up)),
        }
    }

    pub fn touch(
        &mut self,
        phase: TouchPhase,
        id: u64,
        location: PhysicalPosition<f64>,
    ) -> Option<CarouselInput> {
        let x = self.to_logical(location.x);
        match phase {
            TouchPhase::Started => {
                if self.active_touch.is_some() {
                    return None;
                }
                self.active_touch = Some(id);
                Some(CarouselInput::Pointer(PointerEvent::Down { x }))
            }
            TouchPhase::Moved if self.active_touch == Some(id) => {
                Some(CarouselInput::Pointer(PointerEvent::Move { x }))
            }
            TouchPhase::Ended | TouchPhase::Cancelled if self.active_touch == Some(id) => {
                self.active_touch = None;
                Some(CarouselInput::Pointer(PointerEvent::Up))
            }
            _ => None,
        }
    }

    pub fn wheel(&mut self, delta: MouseScrollDelta) -> Option<CarouselInput> {
        // winit reports "scroll up" as positive y; browsers report it as negative.
        let delta_y = match delta {
            MouseScrollDelta::LineDelta(_, y) => -y,
            MouseScrollDelta::PixelDelta(position) => -(position.y as f32),
        };
        if delta_y == 0.0 {
            return None;
        }
        Some(CarouselInput::Wheel(WheelEvent { delta_y }))
    }

    fn to_logical(&self, physical: f64) -> f32 {
        (physical / self.scale_factor) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_press_uses_last_cursor_position() {
        let mut translator = InputTranslator::new(2.0);
        assert_eq!(
            translator.mouse_button(ElementState::Pressed, MouseButton::Left),
            None,
            "no cursor position yet"
        );
        translator.cursor_moved(PhysicalPosition::new(400.0, 10.0));
        assert_eq!(
            translator.mouse_button(ElementState::Pressed, MouseButton::Left),
            Some(CarouselInput::Pointer(PointerEvent::Down { x: 200.0 }))
        );
        assert_eq!(
            translator.mouse_button(ElementState::Released, MouseButton::Left),
            Some(CarouselInput::Pointer(PointerEvent::Up))
        );
        assert_eq!(
            translator.mouse_button(ElementState::Pressed, MouseButton::Right),
            None
        );
    }

    #[test]
    fn touch_and_mouse_share_one_event_shape() {
        let mut translator = InputTranslator::new(1.0);
        let down = translator.touch(TouchPhase::Started, 7, PhysicalPosition::new(120.0, 0.0));
        assert_eq!(down, Some(CarouselInput::Pointer(PointerEvent::Down { x: 120.0 })));
        // A second finger does not hijack the drag.
        assert_eq!(
            translator.touch(TouchPhase::Started, 8, PhysicalPosition::new(10.0, 0.0)),
            None
        );
        assert_eq!(
            translator.touch(TouchPhase::Moved, 8, PhysicalPosition::new(10.0, 0.0)),
            None
        );
        assert_eq!(
            translator.touch(TouchPhase::Moved, 7, PhysicalPosition::new(90.0, 0.0)),
            Some(CarouselInput::Pointer(PointerEvent::Move { x: 90.0 }))
        );
        assert_eq!(
            translator.touch(TouchPhase::Ended, 7, PhysicalPosition::new(90.0, 0.0)),
            Some(CarouselInput::Pointer(PointerEvent::Up))
        );
    }

    #[test]
    fn wheel_follows_browser_sign() {
        let mut translator = InputTranslator::new(1.0);
        assert_eq!(
            translator.wheel(MouseScrollDelta::LineDelta(0.0, -1.0)),
            Some(CarouselInput::Wheel(WheelEvent { delta_y: 1.0 }))
        );
        assert_eq!(
            translator.wheel(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 12.0))),
            Some(CarouselInput::Wheel(WheelEvent { delta_y: -12.0 }))
        );
        assert_eq!(translator.wheel(MouseScrollDelta::LineDelta(3.0, 0.0)), None);
    }
}
