use std::sync::Arc;

use glam::{Mat4, Vec3};

use super::bounds::Aabb;
use super::transform::Transform;
use crate::asset::ModelData;

/// Identity of one attached model. A fresh id is issued on every attach so
/// the renderer can tell when to replace its GPU resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub u64);

/// Which space a model's transform is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Attachment {
    /// Transform is relative to the world origin.
    #[default]
    World,
    /// Transform is relative to the camera; the model keeps its on-screen
    /// placement while the camera orbits.
    Camera,
}

/// The model currently on display.
#[derive(Debug, Clone)]
pub struct Model {
    /// Attach identity.
    pub id: ModelId,
    /// Display name.
    pub name: String,
    /// Imported geometry, shared with the renderer.
    pub data: Arc<ModelData>,
    /// Root transform in the space named by `attachment`.
    pub transform: Transform,
    /// Parent space of `transform`.
    pub attachment: Attachment,
}

impl Model {
    /// Wrap imported data with an identity transform in world space.
    #[must_use]
    pub fn new(id: ModelId, data: ModelData) -> Self {
        Self {
            id,
            name: data.name.clone(),
            data: Arc::new(data),
            transform: Transform::IDENTITY,
            attachment: Attachment::World,
        }
    }

    /// Model-to-world matrix. `camera_world` is the camera's own world
    /// matrix (the inverse of its view matrix).
    #[must_use]
    pub fn world_matrix(&self, camera_world: Mat4) -> Mat4 {
        match self.attachment {
            Attachment::World => self.transform.matrix(),
            Attachment::Camera => camera_world * self.transform.matrix(),
        }
    }

    /// World-space bounds of the transformed geometry.
    #[must_use]
    pub fn world_bounds(&self, camera_world: Mat4) -> Aabb {
        self.data.bounds().transformed(self.world_matrix(camera_world))
    }

    /// Scale uniformly so the longest edge equals `target_size` and center
    /// the bounds on the origin. Degenerate (zero-size) geometry keeps a
    /// scale of one.
    pub fn normalize(&mut self, target_size: f32) {
        let bounds = self.data.bounds();
        let max_dim = bounds.max_dimension();
        let scale = if max_dim > f32::EPSILON {
            target_size / max_dim
        } else {
            1.0
        };
        self.transform = Transform {
            translation: -bounds.center() * scale,
            rotation: glam::Quat::IDENTITY,
            scale: Vec3::splat(scale),
        };
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::asset::test_support::box_model;

    #[test]
    fn normalize_fits_longest_edge_and_centers() {
        let data = box_model(Vec3::new(2.0, 0.0, 0.0), Vec3::new(6.0, 2.0, 1.0));
        let mut model = Model::new(ModelId(1), data);
        model.normalize(1.6);

        let bounds = model.world_bounds(Mat4::IDENTITY);
        assert_relative_eq!(bounds.max_dimension(), 1.6, epsilon = 1e-5);
        assert_relative_eq!(bounds.center().x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(bounds.center().y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(bounds.center().z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn degenerate_geometry_keeps_unit_scale() {
        let data = box_model(Vec3::splat(3.0), Vec3::splat(3.0));
        let mut model = Model::new(ModelId(1), data);
        model.normalize(1.6);
        assert_eq!(model.transform.scale, Vec3::ONE);
        assert_eq!(model.transform.translation, Vec3::splat(-3.0));
    }

    #[test]
    fn camera_attached_model_follows_camera_matrix() {
        let data = box_model(Vec3::splat(-0.5), Vec3::splat(0.5));
        let mut model = Model::new(ModelId(1), data);
        model.attachment = Attachment::Camera;
        model.transform.translation = Vec3::new(0.0, 0.0, -2.0);

        let camera_world = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
        let center = model.world_bounds(camera_world).center();
        assert_relative_eq!(center.x, 5.0, epsilon = 1e-5);
        assert_relative_eq!(center.z, -2.0, epsilon = 1e-5);
    }
}
