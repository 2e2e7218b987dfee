use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use crate::camera::core::Camera;
use crate::options::ControlsOptions;

/// Keeps `phi` strictly inside `(0, π)` so the orbit never flips over a pole.
const POLE_EPSILON: f32 = 1e-6;

/// Damped spherical orbit around a target point.
///
/// Gestures accumulate pending deltas (`rotate`, `pan`, `dolly`); each
/// [`update`](Self::update) applies a `damping_factor` fraction of them to
/// the camera and decays the rest, so the view coasts to a stop.
/// Distance and polar angle are clamped on every update.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    /// Point the camera orbits and looks at.
    pub target: Vec3,
    options: ControlsOptions,
    theta_delta: f32,
    phi_delta: f32,
    pan_offset: Vec3,
    scale: f32,
}

impl OrbitControls {
    /// Create controls orbiting `target`.
    #[must_use]
    pub fn new(target: Vec3, options: ControlsOptions) -> Self {
        Self {
            target,
            options,
            theta_delta: 0.0,
            phi_delta: 0.0,
            pan_offset: Vec3::ZERO,
            scale: 1.0,
        }
    }

    /// Current limits and sensitivities.
    #[must_use]
    pub fn options(&self) -> &ControlsOptions {
        &self.options
    }

    /// Replace limits and sensitivities.
    pub fn set_options(&mut self, options: ControlsOptions) {
        self.options = options;
    }

    /// Closest allowed distance.
    #[must_use]
    pub fn min_distance(&self) -> f32 {
        self.options.min_distance
    }

    /// Farthest allowed distance.
    #[must_use]
    pub fn max_distance(&self) -> f32 {
        self.options.max_distance
    }

    /// Queue an orbit by a screen-space drag of `delta` pixels. A drag across
    /// the full viewport height turns the camera by one full revolution.
    pub fn rotate(&mut self, delta: Vec2, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        let speed = self.options.rotate_speed;
        self.theta_delta -= TAU * delta.x / h * speed;
        self.phi_delta -= TAU * delta.y / h * speed;
    }

    /// Queue a pan by a screen-space drag of `delta` pixels, so the point
    /// under the cursor at target depth follows the pointer.
    pub fn pan(&mut self, delta: Vec2, camera: &Camera, viewport_height: f32) {
        if !self.options.enable_pan {
            return;
        }
        let h = viewport_height.max(1.0);
        let half_height =
            camera.distance() * (camera.fovy.to_radians() * 0.5).tan();
        let world_per_pixel = 2.0 * half_height / h;

        let forward = (camera.target - camera.eye).normalize_or_zero();
        let right = forward.cross(camera.up).normalize_or_zero();
        let up = right.cross(forward);

        self.pan_offset += (up * delta.y - right * delta.x)
            * world_per_pixel
            * self.options.pan_speed;
    }

    /// Queue a dolly. Positive `amount` moves toward the target.
    pub fn dolly(&mut self, amount: f32) {
        let step = 0.95_f32.powf(self.options.zoom_speed * amount.abs());
        if amount > 0.0 {
            self.scale *= step;
        } else if amount < 0.0 {
            self.scale /= step;
        }
    }

    /// Drop any pending rotate/pan/dolly deltas.
    pub fn stop(&mut self) {
        self.theta_delta = 0.0;
        self.phi_delta = 0.0;
        self.pan_offset = Vec3::ZERO;
        self.scale = 1.0;
    }

    /// Whether any damped motion is still pending.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.theta_delta.abs() > 1e-5
            || self.phi_delta.abs() > 1e-5
            || self.pan_offset.length_squared() > 1e-10
            || (self.scale - 1.0).abs() > 1e-6
    }

    /// Apply pending motion and limits, writing the result into `camera`.
    /// Returns `true` if the eye moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let before = camera.eye;
        let offset = camera.eye - self.target;
        let radius = offset.length().max(POLE_EPSILON);

        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        let factor = if self.options.enable_damping {
            self.options.damping_factor
        } else {
            1.0
        };
        theta += self.theta_delta * factor;
        phi += self.phi_delta * factor;
        phi = phi
            .clamp(self.options.min_polar_angle, self.options.max_polar_angle)
            .clamp(POLE_EPSILON, PI - POLE_EPSILON);

        let radius = (radius * self.scale)
            .clamp(self.options.min_distance, self.options.max_distance);
        self.target += self.pan_offset * factor;

        let sin_phi = phi.sin();
        let new_offset = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        camera.eye = self.target + new_offset;
        camera.target = self.target;

        if self.options.enable_damping {
            let keep = 1.0 - factor;
            self.theta_delta *= keep;
            self.phi_delta *= keep;
            self.pan_offset *= keep;
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        camera.eye.distance_squared(before) > 1e-12
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::options::CameraOptions;

    fn setup() -> (Camera, OrbitControls) {
        let camera = Camera::from_options(&CameraOptions::default());
        let controls =
            OrbitControls::new(camera.target, ControlsOptions::default());
        (camera, controls)
    }

    #[test]
    fn idle_update_keeps_pose() {
        let (mut camera, mut controls) = setup();
        let eye = camera.eye;
        let _ = controls.update(&mut camera);
        assert_relative_eq!(camera.eye.x, eye.x, epsilon = 1e-5);
        assert_relative_eq!(camera.eye.y, eye.y, epsilon = 1e-5);
        assert_relative_eq!(camera.eye.z, eye.z, epsilon = 1e-5);
    }

    #[test]
    fn rotation_preserves_distance() {
        let (mut camera, mut controls) = setup();
        let distance = camera.distance();
        controls.rotate(Vec2::new(120.0, 0.0), 600.0);
        for _ in 0..60 {
            let _ = controls.update(&mut camera);
        }
        assert_relative_eq!(camera.distance(), distance, epsilon = 1e-4);
        assert!(camera.eye.x.abs() > 0.1);
    }

    #[test]
    fn damping_decays_pending_motion() {
        let (mut camera, mut controls) = setup();
        controls.rotate(Vec2::new(50.0, 0.0), 600.0);
        assert!(controls.is_moving());
        for _ in 0..400 {
            let _ = controls.update(&mut camera);
        }
        assert!(!controls.is_moving());
    }

    #[test]
    fn distance_is_clamped() {
        let (mut camera, mut controls) = setup();
        camera.eye = controls.target + Vec3::new(0.0, 0.0, 500.0);
        let _ = controls.update(&mut camera);
        assert_relative_eq!(camera.distance(), 50.0, epsilon = 1e-3);

        camera.eye = controls.target + Vec3::new(0.0, 0.0, 0.01);
        let _ = controls.update(&mut camera);
        assert_relative_eq!(camera.distance(), 0.3, epsilon = 1e-4);
    }

    #[test]
    fn polar_angle_is_clamped_near_the_top() {
        let (mut camera, mut controls) = setup();
        camera.eye = controls.target + Vec3::new(0.0, 3.0, 0.0);
        let _ = controls.update(&mut camera);
        let offset = camera.eye - controls.target;
        let phi = (offset.y / offset.length()).acos();
        assert!(phi >= PI * 0.15 - 1e-4, "phi = {phi}");
    }

    #[test]
    fn dolly_in_moves_closer() {
        let (mut camera, mut controls) = setup();
        let distance = camera.distance();
        controls.dolly(1.0);
        let _ = controls.update(&mut camera);
        assert!(camera.distance() < distance);
    }

    #[test]
    fn pan_moves_target() {
        let (mut camera, mut controls) = setup();
        let target = controls.target;
        controls.pan(Vec2::new(100.0, 0.0), &camera, 600.0);
        for _ in 0..200 {
            let _ = controls.update(&mut camera);
        }
        assert!(controls.target.distance(target) > 0.05);
        assert_eq!(camera.target, controls.target);
    }
}
