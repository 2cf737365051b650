//! CPU-side layouts of everything uploaded to the GPU.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use portal_common::{Color, Geometry};
use portal_scene::{Fireflies, FirefliesUniforms, PortalUniforms};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// One firefly sprite, drawn as an instanced quad.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct ParticleInstance {
    pub position: [f32; 3],
    pub scale: f32,
}

/// Bind group 0, shared by every pipeline.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct CameraUniforms {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    /// Drawable size in physical pixels.
    pub resolution: [f32; 2],
    pub _pad: [f32; 2],
}

/// Bind group 1 of the mesh pipelines.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

/// Matches `struct Portal` in the portal shader (vec3 + f32 pairs pack into 16 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct PortalBlock {
    pub color_start: [f32; 3],
    pub time: f32,
    pub color_end: [f32; 3],
    pub effect_speed: f32,
    pub outer_glow: f32,
    pub displaced_uv: f32,
    pub strength: f32,
    pub strength_step: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct FirefliesBlock {
    pub time: f32,
    pub pixel_ratio: f32,
    pub size: f32,
    pub _pad: f32,
}

impl CameraUniforms {
    pub fn new(view: Mat4, projection: Mat4, width: u32, height: u32) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            resolution: [width.max(1) as f32, height.max(1) as f32],
            _pad: [0.0; 2],
        }
    }
}

impl ObjectUniforms {
    pub fn new(model: Mat4, color: Color) -> Self {
        let [r, g, b] = color.to_array();
        Self {
            model: model.to_cols_array_2d(),
            color: [r, g, b, 1.0],
        }
    }
}

impl From<&PortalUniforms> for PortalBlock {
    fn from(u: &PortalUniforms) -> Self {
        Self {
            color_start: u.color_start.to_array(),
            time: u.time,
            color_end: u.color_end.to_array(),
            effect_speed: u.effect_speed,
            outer_glow: u.outer_glow,
            displaced_uv: u.displaced_uv,
            strength: u.strength,
            strength_step: u.strength_step,
        }
    }
}

impl From<&FirefliesUniforms> for FirefliesBlock {
    fn from(u: &FirefliesUniforms) -> Self {
        Self {
            time: u.time,
            pixel_ratio: u.pixel_ratio,
            size: u.size,
            _pad: 0.0,
        }
    }
}

/// Interleave positions and UVs. Nodes without UVs get zeros.
pub(crate) fn vertices(geometry: &Geometry) -> Vec<Vertex> {
    geometry
        .positions
        .iter()
        .enumerate()
        .map(|(i, &position)| Vertex {
            position,
            uv: geometry.uvs.get(i).copied().unwrap_or([0.0; 2]),
        })
        .collect()
}

pub(crate) fn instances(fireflies: &Fireflies) -> Vec<ParticleInstance> {
    fireflies
        .positions
        .iter()
        .zip(&fireflies.scales)
        .map(|(&position, &scale)| ParticleInstance { position, scale })
        .collect()
}

pub(crate) fn clear_value(color: Color) -> wgpu::Color {
    wgpu::Color {
        r: color.r as f64,
        g: color.g as f64,
        b: color.b as f64,
        a: 1.0,
    }
}
