//! Asset loaders for the portal scene.
//!
//! Paths are always relative to a content root. Loads can run synchronously
//! (CLI, tests) or on a background thread that hands the result to a
//! completion callback (desktop app). There is no retry, timeout or
//! cancellation: a failed load is reported once through its callback.
//!
//! Models may carry `KHR_draco_mesh_compression` primitives; the bundled
//! [`draco`] decoder expands them unless a loader is built with Draco
//! decoding switched off.

pub mod draco;
mod model;
mod texture;

use portal_common::{LoadedModel, TextureImage};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

/// Errors from loading a model or texture.
#[derive(Debug, thiserror::Error)]
pub enum AssetLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("glTF JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("model has no scene")]
    NoScene,
    #[error("mesh on node {node:?} has a primitive without positions")]
    MissingPositions { node: String },
    #[error("unsupported compression extension {extension}")]
    UnsupportedCompression { extension: String },
    #[error("Draco decode error: {0}")]
    Draco(#[from] draco::DracoError),
    #[error("buffer view {index} is missing or out of bounds")]
    BufferView { index: usize },
}

/// Where the scene's static assets live, and how the model is decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub root: PathBuf,
    pub model: PathBuf,
    pub texture: PathBuf,
    /// Decode `KHR_draco_mesh_compression` primitives. When off, models
    /// that require the extension fail with `UnsupportedCompression`.
    pub draco: bool,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            root: PathBuf::from("static"),
            model: PathBuf::from("portal.glb"),
            texture: PathBuf::from("baked.jpg"),
            draco: true,
        }
    }
}

/// Loads models and textures relative to a content root.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: PathBuf,
    draco: bool,
}

impl AssetLoader {
    /// Loader with Draco decoding on.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            draco: true,
        }
    }

    pub fn with_draco(mut self, enabled: bool) -> Self {
        self.draco = enabled;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn draco(&self) -> bool {
        self.draco
    }

    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Load a `.glb`/`.gltf` model and return its top-level nodes.
    pub fn load_model(&self, relative: impl AsRef<Path>) -> Result<LoadedModel, AssetLoadError> {
        let path = self.resolve(relative);
        tracing::debug!("loading model {}", path.display());
        let model = model::load(&path, self.draco)?;
        tracing::info!(
            "loaded model {} ({} top-level nodes)",
            path.display(),
            model.children.len()
        );
        Ok(model)
    }

    /// Load a color texture (JPEG or PNG) tagged sRGB, without vertical flip.
    pub fn load_texture(&self, relative: impl AsRef<Path>) -> Result<TextureImage, AssetLoadError> {
        let path = self.resolve(relative);
        tracing::debug!("loading texture {}", path.display());
        let texture = texture::load(&path)?;
        tracing::info!(
            "loaded texture {} ({}x{})",
            path.display(),
            texture.width,
            texture.height
        );
        Ok(texture)
    }

    /// Load a model on a worker thread and pass the result to `on_complete`.
    pub fn spawn_model<F>(&self, relative: impl AsRef<Path>, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<LoadedModel, AssetLoadError>) + Send + 'static,
    {
        let loader = self.clone();
        let relative = relative.as_ref().to_path_buf();
        std::thread::spawn(move || on_complete(loader.load_model(relative)))
    }

    /// Load a texture on a worker thread and pass the result to `on_complete`.
    pub fn spawn_texture<F>(&self, relative: impl AsRef<Path>, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<TextureImage, AssetLoadError>) + Send + 'static,
    {
        let loader = self.clone();
        let relative = relative.as_ref().to_path_buf();
        std::thread::spawn(move || on_complete(loader.load_texture(relative)))
    }
}

impl From<&AssetPaths> for AssetLoader {
    fn from(paths: &AssetPaths) -> Self {
        Self::new(&paths.root).with_draco(paths.draco)
    }
}

pub fn crate_info() -> &'static str {
    "portal-assets v0.1.0"
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn resolve_joins_root() {
        let loader = AssetLoader::new("static");
        assert_eq!(loader.resolve("portal.glb"), PathBuf::from("static/portal.glb"));
    }

    #[test]
    fn default_paths() {
        let paths = AssetPaths::default();
        assert_eq!(paths.model, PathBuf::from("portal.glb"));
        assert_eq!(paths.texture, PathBuf::from("baked.jpg"));
        assert!(paths.draco);
    }

    #[test]
    fn loader_follows_the_draco_setting() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_draco_gltf(dir.path(), &["baked"]);
        let mut paths = AssetPaths {
            root: dir.path().to_path_buf(),
            ..AssetPaths::default()
        };

        let model = AssetLoader::from(&paths).load_model("draco.gltf").unwrap();
        assert_eq!(model.children[0].geometry.as_ref().unwrap().vertex_count(), 3);

        paths.draco = false;
        let loader = AssetLoader::from(&paths);
        assert!(!loader.draco());
        let err = loader.load_model("draco.gltf").unwrap_err();
        assert!(matches!(err, AssetLoadError::UnsupportedCompression { .. }));
        assert_eq!(
            err.to_string(),
            "unsupported compression extension KHR_draco_mesh_compression"
        );
    }

    #[test]
    fn spawn_model_invokes_callback() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_gltf(dir.path(), &["baked", "portalLight"]);
        let loader = AssetLoader::new(dir.path());

        let (tx, rx) = mpsc::channel();
        loader
            .spawn_model("model.gltf", move |result| {
                tx.send(result.map(|m| m.children.len())).unwrap();
            })
            .join()
            .unwrap();
        assert_eq!(rx.recv().unwrap().unwrap(), 2);
    }

    #[test]
    fn spawn_texture_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(dir.path());

        let (tx, rx) = mpsc::channel();
        loader
            .spawn_texture("baked.jpg", move |result| {
                tx.send(result.is_err()).unwrap();
            })
            .join()
            .unwrap();
        assert!(rx.recv().unwrap());
    }
}
