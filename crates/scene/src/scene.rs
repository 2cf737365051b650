use crate::assembly::{SceneIntegrityError, assemble};
use crate::fireflies::Fireflies;
use crate::materials::{MaterialBank, MaterialId};
use crate::params::SceneParams;
use glam::Mat4;
use portal_common::{Geometry, LoadedModel};
use rand::Rng;
use std::sync::Arc;

/// Identifier of a top-level scene object, stable for the scene's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// One mesh of the assembled model.
#[derive(Debug, Clone)]
pub struct MeshNode {
    pub name: String,
    pub transform: Mat4,
    pub geometry: Option<Arc<Geometry>>,
    /// `None` for nodes the scene has no material for; those are not drawn.
    pub material: Option<MaterialId>,
}

/// The loaded model after material assignment.
#[derive(Debug, Clone, Default)]
pub struct ModelRoot {
    pub meshes: Vec<MeshNode>,
}

impl ModelRoot {
    pub fn mesh(&self, name: &str) -> Option<&MeshNode> {
        self.meshes.iter().find(|m| m.name == name)
    }
}

/// A point cloud drawn with one material.
#[derive(Debug, Clone)]
pub struct Points {
    pub particles: Fireflies,
    pub material: MaterialId,
}

#[derive(Debug, Clone)]
pub enum SceneObject {
    Model(ModelRoot),
    Points(Points),
}

/// Root container: objects, materials and tunable parameters.
#[derive(Debug, Clone)]
pub struct Scene {
    children: Vec<(NodeId, SceneObject)>,
    next_id: u32,
    pub materials: MaterialBank,
    pub params: SceneParams,
}

impl Scene {
    /// An empty scene with the material bank and default parameters.
    pub fn empty(device_pixel_ratio: f32) -> Self {
        Self {
            children: Vec::new(),
            next_id: 0,
            materials: MaterialBank::new(),
            params: SceneParams::new(device_pixel_ratio),
        }
    }

    /// The startup scene: fireflies are added right away, the model later.
    pub fn new<R: Rng>(device_pixel_ratio: f32, rng: &mut R) -> Self {
        let mut scene = Self::empty(device_pixel_ratio);
        let points = Points {
            particles: Fireflies::generate(rng),
            material: scene.materials.fireflies(),
        };
        scene.add(SceneObject::Points(points));
        scene
    }

    pub fn add(&mut self, object: SceneObject) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.children.push((id, object));
        id
    }

    /// Assign materials to `model` and add it. On error the scene is unchanged.
    pub fn attach_model(&mut self, model: LoadedModel) -> Result<NodeId, SceneIntegrityError> {
        let root = assemble(model, &self.materials)?;
        let id = self.add(SceneObject::Model(root));
        tracing::info!("model attached as node {}", id.0);
        Ok(id)
    }

    pub fn children(&self) -> impl Iterator<Item = (NodeId, &SceneObject)> {
        self.children.iter().map(|(id, obj)| (*id, obj))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn model(&self) -> Option<(NodeId, &ModelRoot)> {
        self.children().find_map(|(id, obj)| match obj {
            SceneObject::Model(m) => Some((id, m)),
            _ => None,
        })
    }

    pub fn points(&self) -> Option<(NodeId, &Points)> {
        self.children().find_map(|(id, obj)| match obj {
            SceneObject::Points(p) => Some((id, p)),
            _ => None,
        })
    }
}
