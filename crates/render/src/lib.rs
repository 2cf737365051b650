//! Renderer-agnostic presentation layer.
//!
//! Owns the camera, the orbit controls and the per-frame update order.
//! Backends implement [`Renderer`]; everything else in this crate is plain
//! math and bookkeeping so it runs headless.
//!
//! # Invariants
//! - Time uniforms are written before the draw call of the same frame.
//! - The camera aspect always equals the last viewport's width / height.
//! - The pixel ratio handed to renderers never exceeds 2.

pub mod camera;
pub mod clock;
pub mod controls;
pub mod frame;
pub mod renderer;
pub mod stage;

pub use camera::PerspectiveCamera;
pub use clock::{Clock, ManualClock, TimeSource};
pub use controls::OrbitControls;
pub use frame::{FrameInfo, FrameLoop};
pub use renderer::{DrawRecord, HeadlessRenderer, Renderer};
pub use stage::{Stage, Viewport};

pub fn crate_info() -> &'static str {
    "portal-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
