use glam::{Mat4, Vec3};

pub const DEFAULT_FOV_DEGREES: f32 = 45.0;
pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 100.0;
pub const DEFAULT_POSITION: Vec3 = Vec3::new(4.0, 2.0, 4.0);

/// Perspective camera looking at `target`.
///
/// The projection matrix is cached; after changing `fov_degrees`, `aspect`,
/// `near` or `far`, call [`update_projection_matrix`](Self::update_projection_matrix).
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Mat4,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PerspectiveCamera {
    pub fn new(aspect: f32) -> Self {
        let mut camera = Self {
            position: DEFAULT_POSITION,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_degrees: DEFAULT_FOV_DEGREES,
            aspect,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        );
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Camera-space x axis in world coordinates.
    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize_or_zero()
    }

    /// Camera-space y axis in world coordinates.
    pub fn camera_up(&self) -> Vec3 {
        self.right().cross(self.forward())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_looks_at_origin() {
        let cam = PerspectiveCamera::default();
        assert_eq!(cam.position, Vec3::new(4.0, 2.0, 4.0));
        assert_eq!(cam.fov_degrees, 45.0);
        assert_eq!((cam.near, cam.far), (0.1, 100.0));

        let origin = cam.view_projection().project_point3(Vec3::ZERO);
        assert!(origin.x.abs() < 1e-5 && origin.y.abs() < 1e-5);
    }

    #[test]
    fn projection_is_cached_until_updated() {
        let mut cam = PerspectiveCamera::new(1.0);
        let before = cam.projection_matrix();

        cam.aspect = 2.0;
        assert_eq!(cam.projection_matrix(), before);

        cam.update_projection_matrix();
        assert_eq!(
            cam.projection_matrix(),
            Mat4::perspective_rh(45.0_f32.to_radians(), 2.0, 0.1, 100.0)
        );
    }

    #[test]
    fn camera_axes_are_orthonormal() {
        let cam = PerspectiveCamera::default();
        let (f, r, u) = (cam.forward(), cam.right(), cam.camera_up());
        assert!(f.dot(r).abs() < 1e-5);
        assert!(f.dot(u).abs() < 1e-5);
        assert!((u.length() - 1.0).abs() < 1e-5);
        assert!(u.y > 0.0);
    }
}
