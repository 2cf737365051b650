//! Scene state for the portal demo.
//!
//! The scene is built once at startup with its material bank, shader
//! parameters and fireflies, then receives the loaded model when it
//! arrives. Nothing is ever removed.
//!
//! # Invariants
//! - `SceneParams` is the only home of tunable values: the debug panel
//!   writes it, the frame loop and renderer read it.
//! - Model assembly either assigns every expected material or changes nothing.

pub mod assembly;
pub mod fireflies;
pub mod materials;
pub mod panel;
pub mod params;
pub mod scene;

pub use assembly::{SceneIntegrityError, assemble};
pub use fireflies::{FIREFLIES_COUNT, Fireflies};
pub use materials::{Blending, Material, MaterialBank, MaterialId, ShaderMaterial, ShaderProgram};
pub use panel::{SceneEffect, scene_panel};
pub use params::{DebugColors, FirefliesUniforms, PortalUniforms, SceneParams, clamp_pixel_ratio};
pub use scene::{MeshNode, ModelRoot, NodeId, Points, Scene, SceneObject};

pub fn crate_info() -> &'static str {
    "portal-scene v0.1.0"
}
