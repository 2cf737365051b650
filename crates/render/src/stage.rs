use crate::camera::PerspectiveCamera;
use crate::controls::OrbitControls;
use crate::renderer::Renderer;
use portal_input::NavAction;
use portal_scene::{Scene, SceneEffect, clamp_pixel_ratio};
use rand::Rng;

/// Drawable area in physical pixels plus the display's device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    /// Zero-sized viewports (minimized windows) report an aspect of 1.
    pub fn aspect(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub fn pixel_ratio(&self) -> f32 {
        clamp_pixel_ratio(self.device_pixel_ratio)
    }

    /// Size the scene is drawn at. Displays denser than the clamped ratio
    /// get a buffer scaled down from the physical size, so the effective
    /// ratio is `logical size x pixel_ratio()`.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        let device = self.device_pixel_ratio;
        let ratio = self.pixel_ratio();
        if !device.is_finite() || device <= 0.0 || ratio >= device {
            return (self.width, self.height);
        }
        let scale = ratio / device;
        let scaled = |n: u32| {
            if n == 0 {
                0
            } else {
                ((n as f32 * scale).round() as u32).max(1)
            }
        };
        (scaled(self.width), scaled(self.height))
    }
}

/// Everything a frame needs: the scene, the camera and its controls.
#[derive(Debug, Clone)]
pub struct Stage {
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    viewport: Viewport,
}

impl Stage {
    pub fn new<R: Rng>(viewport: Viewport, rng: &mut R) -> Self {
        Self::with_scene(Scene::new(viewport.device_pixel_ratio, rng), viewport)
    }

    pub fn with_scene(scene: Scene, viewport: Viewport) -> Self {
        let mut camera = PerspectiveCamera::new(viewport.aspect());
        let mut controls = OrbitControls::for_scene();
        controls.update(&mut camera);
        Self {
            scene,
            camera,
            controls,
            viewport,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Push the current viewport and clear color to `renderer`.
    pub fn configure<R: Renderer>(&self, renderer: &mut R) {
        renderer.set_viewport(self.viewport);
        renderer.set_clear_color(self.scene.params.clear_color());
    }

    /// Adopt a new viewport: camera aspect and projection, the renderer's
    /// surface and drawing buffer, and the fireflies' pixel-ratio uniform.
    pub fn resize<R: Renderer>(&mut self, viewport: Viewport, renderer: &mut R) {
        self.viewport = viewport;
        self.camera.aspect = viewport.aspect();
        self.camera.update_projection_matrix();
        self.scene.params.set_pixel_ratio(viewport.device_pixel_ratio);
        renderer.set_viewport(viewport);
        let (buffer_width, buffer_height) = viewport.drawing_buffer_size();
        tracing::debug!(
            "resized to {}x{} (pixel ratio {:.2}, drawing buffer {}x{})",
            viewport.width,
            viewport.height,
            viewport.pixel_ratio(),
            buffer_width,
            buffer_height
        );
    }

    pub fn navigate(&mut self, action: NavAction) {
        self.controls
            .apply(action, &self.camera, self.viewport.height as f32);
    }

    /// Carry out a side effect requested by the debug panel.
    pub fn apply_effect<R: Renderer>(&self, effect: SceneEffect, renderer: &mut R) {
        match effect {
            SceneEffect::ClearColor(color) => renderer.set_clear_color(color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::HeadlessRenderer;
    use glam::Vec2;
    use portal_common::Color;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn stage(viewport: Viewport) -> Stage {
        Stage::new(viewport, &mut StdRng::seed_from_u64(11))
    }

    #[test]
    fn resize_updates_aspect_size_and_pixel_ratio() {
        let mut stage = stage(Viewport::new(800, 600, 1.0));
        let mut renderer = HeadlessRenderer::new();

        stage.resize(Viewport::new(1024, 512, 3.0), &mut renderer);

        assert_eq!(stage.camera.aspect, 2.0);
        assert_eq!(renderer.size, (1024, 512));
        assert_eq!(renderer.pixel_ratio, 2.0);
        assert_eq!(renderer.drawing_buffer, (683, 341));
        assert_eq!(stage.scene.params.fireflies.pixel_ratio, 2.0);
        assert_eq!(
            stage.camera.projection_matrix(),
            glam::Mat4::perspective_rh(45.0_f32.to_radians(), 2.0, 0.1, 100.0)
        );
    }

    #[test]
    fn pixel_ratio_below_two_passes_through() {
        let mut stage = stage(Viewport::new(800, 600, 1.0));
        let mut renderer = HeadlessRenderer::new();
        stage.resize(Viewport::new(800, 600, 1.5), &mut renderer);
        assert_eq!(renderer.pixel_ratio, 1.5);
        assert_eq!(renderer.drawing_buffer, (800, 600));
        assert_eq!(stage.scene.params.fireflies.pixel_ratio, 1.5);
    }

    #[test]
    fn drawing_buffer_is_capped_at_twice_the_logical_size() {
        // 1280x720 logical at 3x.
        assert_eq!(Viewport::new(3840, 2160, 3.0).drawing_buffer_size(), (2560, 1440));
        assert_eq!(Viewport::new(2560, 1440, 3.0).drawing_buffer_size(), (1707, 960));
        assert_eq!(Viewport::new(2560, 1440, 2.0).drawing_buffer_size(), (2560, 1440));
        assert_eq!(Viewport::new(1200, 900, 1.5).drawing_buffer_size(), (1200, 900));
    }

    #[test]
    fn drawing_buffer_keeps_degenerate_sizes() {
        assert_eq!(Viewport::new(0, 0, 4.0).drawing_buffer_size(), (0, 0));
        assert_eq!(Viewport::new(1, 1, 4.0).drawing_buffer_size(), (1, 1));
        assert_eq!(Viewport::new(640, 480, 0.0).drawing_buffer_size(), (640, 480));
    }

    #[test]
    fn zero_sized_viewport_keeps_a_finite_aspect() {
        let mut stage = stage(Viewport::new(800, 600, 1.0));
        stage.resize(Viewport::new(0, 0, 1.0), &mut HeadlessRenderer::new());
        assert!(stage.camera.projection_matrix().is_finite());
    }

    #[test]
    fn configure_pushes_clear_color() {
        let stage = stage(Viewport::new(800, 600, 2.5));
        let mut renderer = HeadlessRenderer::new();
        stage.configure(&mut renderer);
        assert_eq!(renderer.clear_color, stage.scene.params.clear_color());
        assert_eq!(renderer.pixel_ratio, 2.0);
    }

    #[test]
    fn clear_color_effect_reaches_renderer() {
        let stage = stage(Viewport::new(800, 600, 1.0));
        let mut renderer = HeadlessRenderer::new();
        stage.apply_effect(SceneEffect::ClearColor(Color::WHITE), &mut renderer);
        assert_eq!(renderer.clear_color, Color::WHITE);
    }

    #[test]
    fn navigate_queues_camera_motion() {
        let mut stage = stage(Viewport::new(800, 600, 1.0));
        let start = stage.camera.position;
        stage.navigate(NavAction::Rotate(Vec2::new(50.0, 0.0)));
        assert!(stage.controls.update(&mut stage.camera));
        assert_ne!(stage.camera.position, start);
    }
}
