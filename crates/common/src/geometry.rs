use glam::Mat4;
use std::sync::Arc;

/// Triangle geometry with one UV set. Indices are always present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Append another primitive, rebasing its indices.
    pub fn append(&mut self, other: Geometry) {
        let base = self.positions.len() as u32;
        self.positions.extend(other.positions);
        self.uvs.extend(other.uvs);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }
}

/// A top-level node of a loaded model.
#[derive(Debug, Clone)]
pub struct ModelNode {
    pub name: String,
    /// Local transform relative to the model root.
    pub transform: Mat4,
    /// `None` for empty/group nodes.
    pub geometry: Option<Arc<Geometry>>,
}

/// A model as it arrives from the loader: a flat list of named top-level nodes.
#[derive(Debug, Clone, Default)]
pub struct LoadedModel {
    pub children: Vec<ModelNode>,
}

impl LoadedModel {
    /// First top-level child with exactly this name.
    pub fn find(&self, name: &str) -> Option<&ModelNode> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Color encoding of texel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Texels are sRGB-encoded and must be decoded when sampled.
    Srgb,
    /// Texels are already linear (data textures).
    Linear,
}

/// Decoded RGBA8 image plus sampling metadata.
#[derive(Debug, Clone)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    /// Flip rows on upload. glTF UVs already match image row order, so
    /// baked textures are loaded with this off.
    pub flip_y: bool,
    pub color_space: ColorSpace,
}

impl TextureImage {
    /// Texel rows in upload order, honoring `flip_y`.
    pub fn upload_bytes(&self) -> Vec<u8> {
        if !self.flip_y {
            return self.rgba.clone();
        }
        let row = self.width as usize * 4;
        self.rgba
            .chunks_exact(row)
            .rev()
            .flatten()
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Geometry {
        Geometry {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn append_rebases_indices() {
        let mut g = triangle();
        g.append(triangle());
        assert_eq!(g.vertex_count(), 6);
        assert_eq!(&g.indices[3..], &[3, 4, 5]);
    }

    #[test]
    fn find_returns_first_match() {
        let node = |name: &str, x: f32| ModelNode {
            name: name.into(),
            transform: Mat4::from_translation(glam::Vec3::new(x, 0.0, 0.0)),
            geometry: None,
        };
        let model = LoadedModel {
            children: vec![node("baked", 1.0), node("baked", 2.0)],
        };
        let found = model.find("baked").unwrap();
        assert_eq!(found.transform.w_axis.x, 1.0);
        assert!(model.find("Baked").is_none());
    }

    #[test]
    fn upload_bytes_flips_rows_when_asked() {
        let mut tex = TextureImage {
            width: 1,
            height: 2,
            rgba: vec![1, 1, 1, 1, 2, 2, 2, 2],
            flip_y: false,
            color_space: ColorSpace::Srgb,
        };
        assert_eq!(tex.upload_bytes(), vec![1, 1, 1, 1, 2, 2, 2, 2]);
        tex.flip_y = true;
        assert_eq!(tex.upload_bytes(), vec![2, 2, 2, 2, 1, 1, 1, 1]);
    }
}
