//! Perspective camera and damped orbit controls
//!
//! The controls keep the camera on a sphere around a target point. Input
//! accumulates into angular deltas that are bled off a fraction per frame,
//! giving the eased stop after a drag is released.

use std::f32::consts::PI;

use glam::{Mat4, Vec3};

/// Perspective camera looking at a target point
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Eye position in world space
    pub position: Vec3,
    /// Point the camera looks at
    pub target: Vec3,
    /// Vertical field of view in degrees
    pub fov_y_degrees: f32,
    /// Aspect ratio (width/height)
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl PerspectiveCamera {
    pub fn new(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 1.0),
            target: Vec3::ZERO,
            fov_y_degrees,
            aspect,
            near,
            far,
        }
    }

    /// Point the camera at `target`
    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Update aspect ratio on resize
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    /// Get combined view-projection matrix
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Pitch is kept just inside the poles
const PITCH_LIMIT: f32 = PI / 2.0 - 1e-3;

/// Damped orbit controls around a target
#[derive(Debug, Clone)]
pub struct OrbitControls {
    /// Point the camera orbits around
    pub target: Vec3,
    /// Fraction of pending motion applied each update, in (0, 1]
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Pending yaw (radians)
    yaw_delta: f32,
    /// Pending pitch (radians)
    pitch_delta: f32,
    /// Pending radius multiplier
    zoom_scale: f32,
    enabled: bool,
}

impl OrbitControls {
    pub fn new(target: Vec3, damping_factor: f32) -> Self {
        Self {
            target,
            damping_factor: damping_factor.clamp(f32::EPSILON, 1.0),
            min_distance: 1.0,
            max_distance: 500.0,
            yaw_delta: 0.0,
            pitch_delta: 0.0,
            zoom_scale: 1.0,
            enabled: true,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Rotate by pointer movement in pixels over a viewport of `viewport_height`
    pub fn rotate_by_pixels(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if !self.enabled || viewport_height <= 0.0 {
            return;
        }
        self.yaw_delta -= 2.0 * PI * dx / viewport_height;
        self.pitch_delta -= 2.0 * PI * dy / viewport_height;
    }

    /// Zoom by wheel steps; positive moves the camera closer
    pub fn zoom(&mut self, steps: f32) {
        if !self.enabled {
            return;
        }
        self.zoom_scale *= 0.95_f32.powf(steps);
    }

    /// Advance damping and move the camera; returns whether it moved
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        if !self.enabled {
            return false;
        }

        let offset = camera.position - self.target;
        let radius = offset.length().max(f32::EPSILON);
        let mut yaw = offset.x.atan2(offset.z);
        let mut pitch = (offset.y / radius).clamp(-1.0, 1.0).asin();

        yaw += self.yaw_delta * self.damping_factor;
        pitch = (pitch + self.pitch_delta * self.damping_factor).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        let new_radius = (radius * self.zoom_scale).clamp(self.min_distance, self.max_distance);

        let position = self.target
            + Vec3::new(
                new_radius * pitch.cos() * yaw.sin(),
                new_radius * pitch.sin(),
                new_radius * pitch.cos() * yaw.cos(),
            );

        self.yaw_delta *= 1.0 - self.damping_factor;
        self.pitch_delta *= 1.0 - self.damping_factor;
        self.zoom_scale = 1.0;

        let moved = position.distance_squared(camera.position) > 1e-8;
        camera.position = position;
        camera.look_at(self.target);
        moved
    }

    /// Stop reacting to input
    pub fn dispose(&mut self) {
        self.enabled = false;
        self.yaw_delta = 0.0;
        self.pitch_delta = 0.0;
        self.zoom_scale = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(60.0, 1.0, 0.1, 1000.0);
        camera.position = Vec3::new(12.0, 8.0, 0.0);
        camera
    }

    #[test]
    fn test_update_without_input_keeps_position() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(Vec3::ZERO, 0.08);
        assert!(!controls.update(&mut cam));
        assert!((cam.position - Vec3::new(12.0, 8.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_damping_eases_out() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(Vec3::ZERO, 0.08);
        controls.rotate_by_pixels(100.0, 0.0, 800.0);

        let start = cam.position;
        controls.update(&mut cam);
        let first_step = start.distance(cam.position);
        let mid = cam.position;
        controls.update(&mut cam);
        let second_step = mid.distance(cam.position);

        assert!(first_step > 0.0);
        assert!(second_step < first_step);
        // Orbit preserves the radius
        assert!((cam.position.length() - start.length()).abs() < 1e-3);
    }

    #[test]
    fn test_zoom_moves_closer() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(Vec3::ZERO, 0.08);
        let before = cam.position.length();
        controls.zoom(2.0);
        controls.update(&mut cam);
        assert!(cam.position.length() < before);
    }

    #[test]
    fn test_disposed_controls_ignore_input() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(Vec3::ZERO, 0.08);
        controls.dispose();
        controls.rotate_by_pixels(100.0, 50.0, 800.0);
        assert!(!controls.update(&mut cam));
        assert_eq!(cam.position, Vec3::new(12.0, 8.0, 0.0));
    }
}
