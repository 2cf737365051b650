use portal_common::{Color, HexColor, TextureImage};
use std::sync::Arc;

pub const POLE_LIGHT_COLOR: HexColor = HexColor::from_u32(0xffffe5);

/// Index into a [`MaterialBank`]. Two meshes share a material exactly when
/// their ids are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(usize);

impl MaterialId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Custom shader programs. Uniform values for each live in
/// [`SceneParams`](crate::SceneParams).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderProgram {
    Portal,
    Fireflies,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blending {
    Normal,
    /// Source scaled by alpha, added to the destination.
    Additive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShaderMaterial {
    pub program: ShaderProgram,
    pub blending: Blending,
    pub depth_write: bool,
    /// Drawn after every opaque object.
    pub transparent: bool,
}

#[derive(Debug, Clone)]
pub enum Material {
    /// Precomputed lighting; samples the baked texture once it has loaded.
    Baked {
        texture: Option<Arc<TextureImage>>,
        /// Bumped on every texture change so renderers know to re-upload.
        version: u64,
    },
    /// Unlit constant color.
    Basic { color: Color },
    Shader(ShaderMaterial),
}

/// The scene's four materials.
#[derive(Debug, Clone)]
pub struct MaterialBank {
    materials: Vec<Material>,
    baked: MaterialId,
    pole_light: MaterialId,
    portal: MaterialId,
    fireflies: MaterialId,
}

impl Default for MaterialBank {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialBank {
    pub fn new() -> Self {
        let mut materials = Vec::with_capacity(4);
        let mut push = |m: Material| {
            materials.push(m);
            MaterialId(materials.len() - 1)
        };

        let baked = push(Material::Baked {
            texture: None,
            version: 0,
        });
        let pole_light = push(Material::Basic {
            color: Color::from_hex(POLE_LIGHT_COLOR),
        });
        let portal = push(Material::Shader(ShaderMaterial {
            program: ShaderProgram::Portal,
            blending: Blending::Normal,
            depth_write: true,
            transparent: false,
        }));
        let fireflies = push(Material::Shader(ShaderMaterial {
            program: ShaderProgram::Fireflies,
            blending: Blending::Additive,
            depth_write: false,
            transparent: true,
        }));

        Self {
            materials,
            baked,
            pole_light,
            portal,
            fireflies,
        }
    }

    pub fn baked(&self) -> MaterialId {
        self.baked
    }

    pub fn pole_light(&self) -> MaterialId {
        self.pole_light
    }

    pub fn portal(&self) -> MaterialId {
        self.portal
    }

    pub fn fireflies(&self) -> MaterialId {
        self.fireflies
    }

    pub fn get(&self, id: MaterialId) -> &Material {
        &self.materials[id.0]
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(i, m)| (MaterialId(i), m))
    }

    /// Attach the loaded baked lighting texture.
    pub fn set_baked_texture(&mut self, image: TextureImage) {
        if let Material::Baked { texture, version } = &mut self.materials[self.baked.0] {
            *texture = Some(Arc::new(image));
            *version += 1;
        }
    }

    pub fn baked_texture(&self) -> Option<&Arc<TextureImage>> {
        match self.get(self.baked) {
            Material::Baked { texture, .. } => texture.as_ref(),
            _ => None,
        }
    }
}
