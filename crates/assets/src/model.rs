use crate::AssetLoadError;
use crate::draco;
use glam::Mat4;
use gltf::json::validation::{Error as ValidationError, Validate};
use portal_common::{Geometry, LoadedModel, ModelNode};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";
/// Compression extension without a decoder here.
const MESHOPT_EXTENSION: &str = "EXT_meshopt_compression";

/// `KHR_draco_mesh_compression` object on a primitive.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DracoPrimitive {
    buffer_view: usize,
    /// glTF attribute semantic to Draco attribute unique id.
    attributes: BTreeMap<String, u32>,
}

/// Parse a `.glb`/`.gltf` once and import the default scene's top-level
/// nodes. Draco primitives are decoded when `decode_draco` is set.
pub(crate) fn load(path: &Path, decode_draco: bool) -> Result<LoadedModel, AssetLoadError> {
    let bytes = std::fs::read(path).map_err(|source| AssetLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice_without_validation(&bytes)?;
    check_required_extensions(&document, decode_draco)?;
    validate(&document, decode_draco)?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob)?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(AssetLoadError::NoScene)?;

    let mut children = Vec::new();
    for node in scene.nodes() {
        let name = node.name().unwrap_or_default().to_string();
        let geometry = match node.mesh() {
            Some(mesh) => Some(Arc::new(read_mesh(
                &document,
                &mesh,
                &buffers,
                &name,
                decode_draco,
            )?)),
            None => None,
        };
        if node.children().next().is_some() {
            tracing::debug!("node {name:?}: nested children are not imported");
        }
        children.push(ModelNode {
            name,
            transform: Mat4::from_cols_array_2d(&node.transform().matrix()),
            geometry,
        });
    }

    Ok(LoadedModel { children })
}

/// Reject documents that require a compression extension this loader will
/// not decode, so the caller gets a clear error instead of a generic
/// validation failure.
fn check_required_extensions(
    document: &gltf::Document,
    decode_draco: bool,
) -> Result<(), AssetLoadError> {
    for extension in document.extensions_required() {
        let unsupported =
            extension == MESHOPT_EXTENSION || (extension == DRACO_EXTENSION && !decode_draco);
        if unsupported {
            return Err(AssetLoadError::UnsupportedCompression {
                extension: extension.to_string(),
            });
        }
    }
    Ok(())
}

/// Full validation, except that a required Draco extension is accepted when
/// it is decoded here.
fn validate(document: &gltf::Document, decode_draco: bool) -> Result<(), AssetLoadError> {
    let draco_path = format!("= \"{DRACO_EXTENSION}\"");
    let mut errors = Vec::new();
    document
        .as_json()
        .validate(document.as_json(), gltf::json::Path::new, &mut |path, error| {
            let path = path();
            let decoded_here = decode_draco
                && matches!(error, ValidationError::Unsupported)
                && path.as_str().starts_with("extensionsRequired")
                && path.as_str().ends_with(&draco_path);
            if !decoded_here {
                errors.push((path, error));
            }
        });
    if errors.is_empty() {
        Ok(())
    } else {
        Err(gltf::Error::Validation(errors).into())
    }
}

/// Merge all triangle primitives of a mesh into one geometry.
fn read_mesh(
    document: &gltf::Document,
    mesh: &gltf::Mesh,
    buffers: &[gltf::buffer::Data],
    node_name: &str,
    decode_draco: bool,
) -> Result<Geometry, AssetLoadError> {
    let mut geometry = Geometry::default();
    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            tracing::warn!(
                "node {node_name:?}: skipping {:?} primitive",
                primitive.mode()
            );
            continue;
        }
        let part = match primitive.extension_value(DRACO_EXTENSION) {
            Some(extension) if decode_draco => {
                let extension: DracoPrimitive = serde_json::from_value(extension.clone())?;
                read_draco_primitive(document, &extension, buffers, node_name)?
            }
            _ => read_primitive(&primitive, buffers, node_name)?,
        };
        geometry.append(part);
    }
    Ok(geometry)
}

fn read_primitive(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    node_name: &str,
) -> Result<Geometry, AssetLoadError> {
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| AssetLoadError::MissingPositions {
            node: node_name.to_string(),
        })?
        .collect();

    let uvs: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|tc| tc.into_f32().collect())
        .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);

    let indices: Vec<u32> = reader
        .read_indices()
        .map(|iter| iter.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());

    Ok(Geometry {
        positions,
        uvs,
        indices,
    })
}

fn read_draco_primitive(
    document: &gltf::Document,
    extension: &DracoPrimitive,
    buffers: &[gltf::buffer::Data],
    node_name: &str,
) -> Result<Geometry, AssetLoadError> {
    let index = extension.buffer_view;
    let view = document
        .views()
        .nth(index)
        .ok_or(AssetLoadError::BufferView { index })?;
    let start = view.offset();
    let data = buffers
        .get(view.buffer().index())
        .and_then(|buffer| buffer.get(start..start + view.length()))
        .ok_or(AssetLoadError::BufferView { index })?;

    let mesh = draco::decode(data)?;
    let position_id = extension.attributes.get("POSITION").copied().ok_or_else(|| {
        AssetLoadError::MissingPositions {
            node: node_name.to_string(),
        }
    })?;
    let positions = mesh.read::<3>(position_id)?;
    let uvs = match extension.attributes.get("TEXCOORD_0") {
        Some(&id) => mesh.read::<2>(id)?,
        None => vec![[0.0, 0.0]; positions.len()],
    };
    tracing::debug!(
        "node {node_name:?}: decoded Draco primitive ({} points, {} faces)",
        mesh.num_points,
        mesh.faces.len()
    );

    Ok(Geometry {
        positions,
        uvs,
        indices: mesh.indices(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{write_draco_gltf, write_gltf};

    #[test]
    fn loads_named_top_level_nodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gltf(dir.path(), &["baked", "portalLight", "poleLightA", "poleLightB"]);

        let model = load(&path, true).unwrap();
        let names: Vec<_> = model.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["baked", "portalLight", "poleLightA", "poleLightB"]);

        let pole_b = model.find("poleLightB").unwrap();
        assert_eq!(pole_b.transform.w_axis.x, 3.0);
        let geometry = pole_b.geometry.as_ref().unwrap();
        assert_eq!(geometry.vertex_count(), 3);
        assert_eq!(geometry.indices, vec![0, 1, 2]);
        assert_eq!(geometry.uvs[1], [1.0, 0.0]);
    }

    #[test]
    fn decodes_draco_compressed_primitives() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_draco_gltf(dir.path(), &["baked", "portalLight"]);

        let model = load(&path, true).unwrap();
        let portal = model.find("portalLight").unwrap();
        assert_eq!(portal.transform.w_axis.x, 1.0);
        let geometry = portal.geometry.as_ref().unwrap();
        assert_eq!(geometry.indices, vec![0, 1, 2]);
        assert_eq!(geometry.uvs, vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let expected = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
        for (actual, expected) in geometry.positions.iter().zip(expected) {
            assert!((glam::Vec3::from(*actual) - glam::Vec3::from(expected)).length() < 1e-5);
        }
    }

    #[test]
    fn draco_documents_fail_when_decoding_is_off() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_draco_gltf(dir.path(), &["baked"]);

        match load(&path, false) {
            Err(AssetLoadError::UnsupportedCompression { extension }) => {
                assert_eq!(extension, DRACO_EXTENSION);
            }
            other => panic!("expected compression error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_meshopt_compressed_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meshopt.gltf");
        let doc = serde_json::json!({
            "asset": { "version": "2.0" },
            "extensionsUsed": [MESHOPT_EXTENSION],
            "extensionsRequired": [MESHOPT_EXTENSION]
        });
        std::fs::write(&path, doc.to_string()).unwrap();

        match load(&path, true) {
            Err(AssetLoadError::UnsupportedCompression { extension }) => {
                assert_eq!(extension, MESHOPT_EXTENSION);
            }
            other => panic!("expected compression error, got {other:?}"),
        }
    }

    #[test]
    fn other_unsupported_extensions_still_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unknown.gltf");
        let doc = serde_json::json!({
            "asset": { "version": "2.0" },
            "extensionsUsed": [DRACO_EXTENSION, "EXT_unknown"],
            "extensionsRequired": [DRACO_EXTENSION, "EXT_unknown"]
        });
        std::fs::write(&path, doc.to_string()).unwrap();

        match load(&path, true) {
            Err(AssetLoadError::Gltf(gltf::Error::Validation(errors))) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].0.as_str().contains("EXT_unknown"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("portal.glb"), true).unwrap_err();
        assert!(matches!(err, AssetLoadError::Io { .. }));
    }

    #[test]
    fn garbage_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portal.gltf");
        std::fs::write(&path, b"not a model").unwrap();
        assert!(matches!(
            load(&path, true),
            Err(AssetLoadError::Gltf(gltf::Error::Deserialize(_)))
        ));
    }
}
