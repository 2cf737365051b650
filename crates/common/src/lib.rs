//! Shared types for the portal scene.
//!
//! Everything here is plain data: no GPU handles, no I/O. Loaders produce
//! these types and the scene/renderer crates consume them.

mod color;
mod geometry;

pub use color::{Color, ColorParseError, HexColor};
pub use geometry::{ColorSpace, Geometry, LoadedModel, ModelNode, TextureImage};
