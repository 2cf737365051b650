use crate::camera::PerspectiveCamera;
use crate::stage::Viewport;
use glam::Vec3;
use portal_common::Color;
use portal_scene::{Scene, SceneObject};
use std::fmt::Write;

/// Renderer-agnostic interface. All backends implement this trait.
///
/// A renderer reads the scene and camera and produces output; it never
/// mutates the scene.
pub trait Renderer {
    /// Per-frame target handed in by the host (a swapchain view, or `()`).
    type Frame;

    /// Adopt the window's physical size. The scene is drawn at
    /// [`Viewport::drawing_buffer_size`] and scaled to fill the window.
    fn set_viewport(&mut self, viewport: Viewport);

    fn set_clear_color(&mut self, color: Color);

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera, frame: &Self::Frame);
}

/// What a [`HeadlessRenderer`] saw at one draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub portal_time: f32,
    pub fireflies_time: f32,
    pub fireflies_size: f32,
    pub objects: usize,
    pub camera_position: Vec3,
    pub clear_color: Color,
}

/// Renderer with no GPU: records state changes and draw calls, and can
/// describe them as text. Used by the CLI and by tests.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    pub size: (u32, u32),
    pub pixel_ratio: f32,
    pub drawing_buffer: (u32, u32),
    pub clear_color: Color,
    pub draws: Vec<DrawRecord>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self {
            pixel_ratio: 1.0,
            ..Self::default()
        }
    }

    pub fn last_draw(&self) -> Option<&DrawRecord> {
        self.draws.last()
    }

    /// Human-readable summary of the scene as this renderer would draw it.
    pub fn describe(&self, scene: &Scene, camera: &PerspectiveCamera) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Portal scene ({}x{} @ {:.2}x) ===",
            self.size.0, self.size.1, self.pixel_ratio
        );
        let p = camera.position;
        let _ = writeln!(
            out,
            "Camera: pos=({:.2}, {:.2}, {:.2}) fov={:.0} aspect={:.3}",
            p.x, p.y, p.z, camera.fov_degrees, camera.aspect
        );
        let _ = writeln!(out, "Clear: {}", self.clear_color.to_hex());

        for (id, object) in scene.children() {
            match object {
                SceneObject::Model(model) => {
                    let _ = writeln!(out, "  [{}] model, {} meshes", id.0, model.meshes.len());
                    for mesh in &model.meshes {
                        let material = mesh
                            .material
                            .map_or_else(|| "-".to_string(), |m| m.index().to_string());
                        let _ = writeln!(out, "      {} material={}", mesh.name, material);
                    }
                }
                SceneObject::Points(points) => {
                    let _ = writeln!(
                        out,
                        "  [{}] points, {} particles",
                        id.0,
                        points.particles.len()
                    );
                }
            }
        }

        let params = &scene.params;
        let _ = writeln!(
            out,
            "uTime={:.3} uSize={:.0} uPixelRatio={:.2}",
            params.portal.time, params.fireflies.size, params.fireflies.pixel_ratio
        );
        out
    }
}

impl Renderer for HeadlessRenderer {
    type Frame = ();

    fn set_viewport(&mut self, viewport: Viewport) {
        self.size = (viewport.width, viewport.height);
        self.pixel_ratio = viewport.pixel_ratio();
        self.drawing_buffer = viewport.drawing_buffer_size();
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera, _frame: &()) {
        self.draws.push(DrawRecord {
            portal_time: scene.params.portal.time,
            fireflies_time: scene.params.fireflies.time,
            fireflies_size: scene.params.fireflies.size,
            objects: scene.len(),
            camera_position: camera.position,
            clear_color: self.clear_color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn records_draws_and_state() {
        let scene = Scene::new(1.0, &mut StdRng::seed_from_u64(3));
        let camera = PerspectiveCamera::default();
        let mut renderer = HeadlessRenderer::new();

        renderer.set_viewport(Viewport::new(800, 600, 1.0));
        renderer.set_clear_color(Color::WHITE);
        renderer.render(&scene, &camera, &());

        let draw = renderer.last_draw().unwrap();
        assert_eq!(renderer.size, (800, 600));
        assert_eq!(renderer.drawing_buffer, (800, 600));
        assert_eq!(draw.objects, 1);
        assert_eq!(draw.clear_color, Color::WHITE);
    }

    #[test]
    fn describe_lists_scene_objects() {
        let scene = Scene::new(1.0, &mut StdRng::seed_from_u64(3));
        let camera = PerspectiveCamera::default();
        let text = HeadlessRenderer::new().describe(&scene, &camera);

        assert!(text.contains("Portal scene"));
        assert!(text.contains("30 particles"));
        assert!(text.contains("fov=45"));
    }
}
