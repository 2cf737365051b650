use crate::materials::{MaterialBank, MaterialId};
use crate::scene::{MeshNode, ModelRoot};
use portal_common::LoadedModel;

pub const BAKED_MESH: &str = "baked";
pub const PORTAL_LIGHT_MESH: &str = "portalLight";
pub const POLE_LIGHT_A_MESH: &str = "poleLightA";
pub const POLE_LIGHT_B_MESH: &str = "poleLightB";

/// Errors from fitting a loaded model to the scene.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneIntegrityError {
    #[error("expected mesh `{name}` not found in loaded model")]
    MissingMesh { name: String },
    #[error("expected mesh `{name}` is present but has no geometry")]
    NotAMesh { name: String },
}

/// Which material each expected mesh receives. Both pole lights share one.
fn expected_meshes(bank: &MaterialBank) -> [(&'static str, MaterialId); 4] {
    [
        (BAKED_MESH, bank.baked()),
        (PORTAL_LIGHT_MESH, bank.portal()),
        (POLE_LIGHT_A_MESH, bank.pole_light()),
        (POLE_LIGHT_B_MESH, bank.pole_light()),
    ]
}

/// Look up every expected mesh among the model's top-level children (first
/// match by exact name) and assign its material. Fails without producing a
/// partial result if any is absent.
pub fn assemble(model: LoadedModel, bank: &MaterialBank) -> Result<ModelRoot, SceneIntegrityError> {
    let mut assignments = vec![None; model.children.len()];

    for (name, material) in expected_meshes(bank) {
        let index = model
            .children
            .iter()
            .position(|child| child.name == name)
            .ok_or_else(|| SceneIntegrityError::MissingMesh {
                name: name.to_string(),
            })?;
        if model.children[index].geometry.is_none() {
            return Err(SceneIntegrityError::NotAMesh {
                name: name.to_string(),
            });
        }
        assignments[index] = Some(material);
    }

    let meshes = model
        .children
        .into_iter()
        .zip(assignments)
        .map(|(node, material)| {
            if material.is_none() {
                tracing::debug!("mesh {:?} has no scene material", node.name);
            }
            MeshNode {
                name: node.name,
                transform: node.transform,
                geometry: node.geometry,
                material,
            }
        })
        .collect();

    Ok(ModelRoot { meshes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Scene, SceneObject};
    use glam::Mat4;
    use portal_common::{Geometry, ModelNode};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Arc;

    fn model(names: &[&str]) -> LoadedModel {
        let geometry = Arc::new(Geometry {
            positions: vec![[0.0; 3]; 3],
            uvs: vec![[0.0; 2]; 3],
            indices: vec![0, 1, 2],
        });
        LoadedModel {
            children: names
                .iter()
                .map(|name| ModelNode {
                    name: name.to_string(),
                    transform: Mat4::IDENTITY,
                    geometry: Some(geometry.clone()),
                })
                .collect(),
        }
    }

    #[test]
    fn assigns_materials_by_identity() {
        let mut scene = Scene::new(1.0, &mut StdRng::seed_from_u64(1));
        let id = scene
            .attach_model(model(&["baked", "portalLight", "poleLightA", "poleLightB"]))
            .unwrap();

        let bank = &scene.materials;
        let (model_id, root) = scene.model().unwrap();
        assert_eq!(model_id, id);
        assert_eq!(root.mesh("baked").unwrap().material, Some(bank.baked()));
        assert_eq!(root.mesh("portalLight").unwrap().material, Some(bank.portal()));
        assert_eq!(root.mesh("poleLightA").unwrap().material, Some(bank.pole_light()));
        assert_eq!(root.mesh("poleLightB").unwrap().material, Some(bank.pole_light()));
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn missing_pole_light_b_leaves_scene_untouched() {
        let mut scene = Scene::new(1.0, &mut StdRng::seed_from_u64(1));
        let err = scene
            .attach_model(model(&["baked", "portalLight", "poleLightA"]))
            .unwrap_err();

        assert_eq!(
            err,
            SceneIntegrityError::MissingMesh {
                name: "poleLightB".into()
            }
        );
        assert_eq!(scene.len(), 1);
        assert!(scene.model().is_none());
    }

    #[test]
    fn name_match_is_exact() {
        let bank = MaterialBank::new();
        let err = assemble(model(&["Baked", "portalLight", "poleLightA", "poleLightB"]), &bank)
            .unwrap_err();
        assert!(matches!(err, SceneIntegrityError::MissingMesh { name } if name == "baked"));
    }

    #[test]
    fn first_match_wins_and_extras_stay_unassigned() {
        let bank = MaterialBank::new();
        let root = assemble(
            model(&["baked", "baked", "portalLight", "poleLightA", "poleLightB", "ground"]),
            &bank,
        )
        .unwrap();
        assert_eq!(root.meshes[0].material, Some(bank.baked()));
        assert_eq!(root.meshes[1].material, None);
        assert_eq!(root.meshes[5].material, None);
    }

    #[test]
    fn node_without_geometry_is_rejected() {
        let bank = MaterialBank::new();
        let mut m = model(&["baked", "portalLight", "poleLightA", "poleLightB"]);
        m.children[1].geometry = None;
        assert_eq!(
            assemble(m, &bank).unwrap_err(),
            SceneIntegrityError::NotAMesh {
                name: "portalLight".into()
            }
        );
    }

    #[test]
    fn scene_object_holds_the_root() {
        let mut scene = Scene::empty(1.0);
        scene
            .attach_model(model(&["baked", "portalLight", "poleLightA", "poleLightB"]))
            .unwrap();
        assert!(matches!(scene.children().next(), Some((_, SceneObject::Model(_)))));
    }
}
