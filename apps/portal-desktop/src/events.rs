//! Translation of winit input into pointer-state input.

use portal_input::PointerButton;
use winit::event::{MouseButton, MouseScrollDelta};

/// Pixels per wheel line, matching a browser's line-mode wheel delta.
const LINE_HEIGHT: f32 = 100.0;

pub fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

/// Wheel delta in pixels, positive when scrolling towards the user (zoom out).
pub fn wheel_delta(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT,
        MouseScrollDelta::PixelDelta(p) => -p.y as f32,
    }
}
