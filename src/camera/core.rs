use glam::{Mat4, Vec3};

use crate::options::CameraOptions;

/// Perspective camera defined by eye position, target, and projection
/// parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Eye (camera) position in world space.
    pub eye: Vec3,
    /// Look-at target position.
    pub target: Vec3,
    /// Up direction vector.
    pub up: Vec3,
    /// Viewport aspect ratio (width / height).
    pub aspect: f32,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
/// GPU uniform buffer holding the view-projection matrix and eye position.
pub struct CameraUniform {
    /// Combined view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// Camera world-space position.
    pub position: [f32; 3],
    /// Viewport aspect ratio.
    pub aspect: f32,
}

impl Camera {
    /// Camera at the configured starting pose with a square viewport.
    #[must_use]
    pub fn from_options(options: &CameraOptions) -> Self {
        Self {
            eye: Vec3::from_array(options.position),
            target: Vec3::from_array(options.target),
            up: Vec3::Y,
            aspect: 1.0,
            fovy: options.fovy,
            znear: options.znear,
            zfar: options.zfar,
        }
    }

    /// World-to-view matrix.
    #[must_use]
    pub fn build_view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Projection matrix.
    #[must_use]
    pub fn build_projection(&self) -> Mat4 {
        // perspective_rh already uses [0,1] depth range (wgpu/Vulkan
        // convention)
        Mat4::perspective_rh(
            self.fovy.to_radians(),
            self.aspect,
            self.znear,
            self.zfar,
        )
    }

    /// Build the combined view-projection matrix.
    #[must_use]
    pub fn build_matrix(&self) -> Mat4 {
        self.build_projection() * self.build_view()
    }

    /// Camera-to-world matrix (the camera's own placement in the scene).
    #[must_use]
    pub fn world_matrix(&self) -> Mat4 {
        self.build_view().inverse()
    }

    /// Eye-to-target distance.
    #[must_use]
    pub fn distance(&self) -> f32 {
        self.eye.distance(self.target)
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraUniform {
    /// Create a new camera uniform with identity view-projection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            position: [0.0; 3],
            aspect: 1.0,
        }
    }

    /// Update uniform fields from the given camera's current state.
    pub fn update_view_proj(&mut self, camera: &Camera) {
        self.view_proj = camera.build_matrix().to_cols_array_2d();
        self.position = camera.eye.to_array();
        self.aspect = camera.aspect;
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn default_pose_matches_options() {
        let camera = Camera::from_options(&CameraOptions::default());
        assert_eq!(camera.eye, Vec3::new(0.0, 1.2, 2.5));
        assert_eq!(camera.target, Vec3::new(0.0, 0.8, 0.0));
        assert_eq!(camera.fovy, 55.0);
    }

    #[test]
    fn world_matrix_places_camera_at_eye() {
        let camera = Camera::from_options(&CameraOptions::default());
        let origin = camera.world_matrix().transform_point3(Vec3::ZERO);
        assert_relative_eq!(origin.x, camera.eye.x, epsilon = 1e-5);
        assert_relative_eq!(origin.y, camera.eye.y, epsilon = 1e-5);
        assert_relative_eq!(origin.z, camera.eye.z, epsilon = 1e-5);
    }

    #[test]
    fn target_projects_to_screen_center() {
        let camera = Camera::from_options(&CameraOptions::default());
        let clip = camera.build_matrix().project_point3(camera.target);
        assert_relative_eq!(clip.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y, 0.0, epsilon = 1e-5);
    }
}
