//! wgpu render backend for the portal scene.
//!
//! Draws the baked model, the pole lights, the animated portal surface and
//! the additive firefly sprites. Implements [`portal_render::Renderer`] with
//! the swapchain view as its frame type.
//!
//! # Invariants
//! - The renderer never mutates the scene.
//! - Transparent passes (fireflies) are drawn after every opaque mesh.
//! - GPU resources are uploaded lazily and cached by scene node.

mod gpu;
mod mesh;
mod renderer;
mod shaders;

pub use gpu::{Gpu, RenderError};
pub use renderer::WgpuRenderer;
