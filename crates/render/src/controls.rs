//! Orbit camera controls with inertia.
//!
//! Input accumulates into pending rotation, pan and zoom; [`OrbitControls::update`]
//! applies a fraction of the pending motion each frame when damping is on,
//! so the camera keeps gliding after the pointer stops.

use crate::camera::PerspectiveCamera;
use glam::{Vec2, Vec3};
use portal_input::NavAction;
use std::f32::consts::{PI, TAU};

const EPS: f32 = 1e-6;

/// Spherical coordinates around +Y: `theta` from +Z towards +X, `phi` from +Y.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Spherical {
    radius: f32,
    theta: f32,
    phi: f32,
}

impl Spherical {
    fn from_offset(v: Vec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let ring = self.phi.sin() * self.radius;
        Vec3::new(
            ring * self.theta.sin(),
            self.phi.cos() * self.radius,
            ring * self.theta.cos(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    // Pending motion, consumed by `update`.
    theta_delta: f32,
    phi_delta: f32,
    pan_offset: Vec3,
    scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: false,
            damping_factor: 0.05,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            theta_delta: 0.0,
            phi_delta: 0.0,
            pan_offset: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl OrbitControls {
    /// Controls for the portal scene: damped, at most 10 units from the
    /// target, never below the horizon.
    pub fn for_scene() -> Self {
        Self {
            enable_damping: true,
            max_distance: 10.0,
            max_polar_angle: PI / 2.0,
            ..Self::default()
        }
    }

    /// Queue one pointer action. `viewport_height` is in the same units as
    /// the action's deltas.
    pub fn apply(&mut self, action: NavAction, camera: &PerspectiveCamera, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        match action {
            NavAction::Rotate(delta) => {
                let d = delta * self.rotate_speed;
                self.rotate_left(TAU * d.x / height);
                self.rotate_up(TAU * d.y / height);
            }
            NavAction::Pan(delta) => self.pan(delta * self.pan_speed, camera, height),
            NavAction::Zoom(delta) => self.zoom(delta),
        }
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.theta_delta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.phi_delta -= angle;
    }

    /// Pan in screen space so a drag of `height` pixels moves the target by
    /// the visible height at the target's distance.
    pub fn pan(&mut self, delta: Vec2, camera: &PerspectiveCamera, viewport_height: f32) {
        let distance = (camera.position - self.target).length();
        let visible = distance * (camera.fov_degrees.to_radians() / 2.0).tan();
        let dx = 2.0 * delta.x * visible / viewport_height;
        let dy = 2.0 * delta.y * visible / viewport_height;
        self.pan_offset += camera.right() * -dx + camera.camera_up() * dy;
    }

    /// Positive deltas move away from the target.
    pub fn zoom(&mut self, delta: f32) {
        if delta == 0.0 {
            return;
        }
        let factor = 0.95_f32.powf(self.zoom_speed * (delta * 0.01).abs());
        if delta > 0.0 {
            self.scale /= factor;
        } else {
            self.scale *= factor;
        }
    }

    /// Move the camera by the pending motion. Returns whether it moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = camera.position;
        let mut sph = Spherical::from_offset(camera.position - self.target);

        let step = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        sph.theta += self.theta_delta * step;
        sph.phi += self.phi_delta * step;
        sph.phi = sph
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPS, PI - EPS);
        sph.radius = (sph.radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pan_offset * step;

        camera.position = self.target + sph.to_offset();
        camera.target = self.target;

        if self.enable_damping {
            self.theta_delta *= 1.0 - self.damping_factor;
            self.phi_delta *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        camera.position.distance_squared(before) > EPS
    }

    /// Radius of the camera from the target.
    pub fn distance(&self, camera: &PerspectiveCamera) -> f32 {
        (camera.position - self.target).length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (OrbitControls, PerspectiveCamera) {
        let mut camera = PerspectiveCamera::default();
        let mut controls = OrbitControls::for_scene();
        controls.update(&mut camera);
        (controls, camera)
    }

    fn theta(camera: &PerspectiveCamera) -> f32 {
        camera.position.x.atan2(camera.position.z)
    }

    #[test]
    fn idle_update_keeps_the_camera_in_place() {
        let (mut controls, mut camera) = setup();
        let start = camera.position;
        assert!(!controls.update(&mut camera));
        assert!(camera.position.distance(start) < 1e-4);
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn damping_spreads_rotation_over_frames() {
        let (mut controls, mut camera) = setup();
        let start = theta(&camera);

        controls.rotate_left(-0.5);
        controls.update(&mut camera);
        let first = theta(&camera) - start;
        assert!((first - 0.5 * 0.05).abs() < 1e-4, "first step {first}");

        // Inertia keeps the camera moving with no further input.
        assert!(controls.update(&mut camera));
        for _ in 0..400 {
            controls.update(&mut camera);
        }
        assert!((theta(&camera) - start - 0.5).abs() < 1e-3);
    }

    #[test]
    fn without_damping_motion_applies_at_once() {
        let mut camera = PerspectiveCamera::default();
        let mut controls = OrbitControls::default();
        let start = theta(&camera);
        controls.rotate_left(-0.25);
        controls.update(&mut camera);
        assert!((theta(&camera) - start - 0.25).abs() < 1e-4);
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn distance_never_exceeds_ten() {
        let (mut controls, mut camera) = setup();
        for _ in 0..100 {
            controls.zoom(1000.0);
            controls.update(&mut camera);
        }
        assert!(controls.distance(&camera) <= 10.0 + 1e-4);
    }

    #[test]
    fn zoom_in_shrinks_distance() {
        let (mut controls, mut camera) = setup();
        let start = controls.distance(&camera);
        controls.zoom(-100.0);
        controls.update(&mut camera);
        assert!(controls.distance(&camera) < start);
    }

    #[test]
    fn camera_cannot_orbit_below_the_horizon() {
        let (mut controls, mut camera) = setup();
        for _ in 0..200 {
            controls.rotate_up(-1.0);
            controls.update(&mut camera);
        }
        assert!(camera.position.y >= controls.target.y - 1e-4);
    }

    #[test]
    fn pan_moves_target_sideways() {
        let mut camera = PerspectiveCamera::default();
        let mut controls = OrbitControls::default();
        controls.update(&mut camera);
        let before = camera.position - controls.target;

        controls.apply(NavAction::Pan(Vec2::new(100.0, 0.0)), &camera, 600.0);
        controls.update(&mut camera);

        assert_ne!(controls.target, Vec3::ZERO);
        // Panning translates; the offset to the target is preserved.
        let after = camera.position - controls.target;
        assert!(after.distance(before) < 1e-4);
        assert!(controls.target.dot(camera.forward()).abs() < 1e-4);
    }

    #[test]
    fn rotate_action_scales_with_viewport_height() {
        let camera = PerspectiveCamera::default();
        let mut small = OrbitControls::default();
        let mut large = OrbitControls::default();
        small.apply(NavAction::Rotate(Vec2::new(10.0, 0.0)), &camera, 300.0);
        large.apply(NavAction::Rotate(Vec2::new(10.0, 0.0)), &camera, 600.0);
        assert!((small.theta_delta - 2.0 * large.theta_delta).abs() < 1e-6);
    }
}
