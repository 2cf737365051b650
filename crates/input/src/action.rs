use glam::Vec2;

/// A navigation request in screen-space pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavAction {
    /// Orbit around the target by a pointer delta.
    Rotate(Vec2),
    /// Move the target in the camera plane by a pointer delta.
    Pan(Vec2),
    /// Dolly toward (negative) or away from (positive) the target.
    Zoom(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Tracks the dragging button and last pointer position.
#[derive(Debug, Clone, Default)]
pub struct PointerState {
    dragging: Option<PointerButton>,
    last: Option<Vec2>,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    pub fn press(&mut self, button: PointerButton) {
        if self.dragging.is_none() {
            self.dragging = Some(button);
        }
    }

    pub fn release(&mut self, button: PointerButton) {
        if self.dragging == Some(button) {
            self.dragging = None;
        }
    }

    /// Record a pointer position; yields an action while a button is held.
    pub fn moved(&mut self, position: Vec2) -> Option<NavAction> {
        let delta = self.last.map(|last| position - last);
        self.last = Some(position);

        let delta = delta.filter(|d| *d != Vec2::ZERO)?;
        match self.dragging? {
            PointerButton::Primary => Some(NavAction::Rotate(delta)),
            PointerButton::Secondary => Some(NavAction::Pan(delta)),
            PointerButton::Middle => Some(NavAction::Zoom(delta.y)),
        }
    }

    /// Wheel scroll in pixels; positive scrolls away from the target.
    pub fn wheel(&mut self, delta_y: f32) -> Option<NavAction> {
        (delta_y != 0.0).then_some(NavAction::Zoom(delta_y))
    }

    /// Forget the pointer, e.g. when it leaves the window.
    pub fn reset(&mut self) {
        self.dragging = None;
        self.last = None;
    }
}
