//! Reparenting between world space and camera space.
//!
//! Switching parents composes the current world matrix and re-expresses it
//! in the new parent's space, so the model does not move on screen at the
//! moment of the switch.

use glam::Mat4;

use crate::scene::{Attachment, Model, Transform};

/// Re-express `model` relative to `parent`, given the camera's world
/// matrix. A no-op if it is already attached there.
pub(crate) fn reparent(model: &mut Model, parent: Attachment, camera_world: Mat4) {
    if model.attachment == parent {
        return;
    }
    let world = model.world_matrix(camera_world);
    let local = match parent {
        Attachment::World => world,
        Attachment::Camera => camera_world.inverse() * world,
    };
    model.transform = Transform::from_matrix(local);
    model.attachment = parent;
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;
    use crate::asset::test_support::box_model;
    use crate::scene::ModelId;

    fn camera_world() -> Mat4 {
        Mat4::look_at_rh(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y).inverse()
    }

    #[test]
    fn lock_then_unlock_preserves_world_matrix() {
        let mut model = Model::new(ModelId(1), box_model(Vec3::ZERO, Vec3::ONE));
        model.transform = Transform {
            translation: Vec3::new(0.5, -0.2, 0.1),
            rotation: Quat::from_rotation_y(0.7),
            scale: Vec3::splat(0.4),
        };
        let cam = camera_world();
        let before = model.world_matrix(cam);

        reparent(&mut model, Attachment::Camera, cam);
        assert_eq!(model.attachment, Attachment::Camera);
        assert!(model.world_matrix(cam).abs_diff_eq(before, 1e-5));

        reparent(&mut model, Attachment::World, cam);
        assert_eq!(model.attachment, Attachment::World);
        assert!(model.world_matrix(cam).abs_diff_eq(before, 1e-5));
    }

    #[test]
    fn reparent_to_same_parent_is_noop() {
        let mut model = Model::new(ModelId(1), box_model(Vec3::ZERO, Vec3::ONE));
        model.transform.translation = Vec3::X;
        reparent(&mut model, Attachment::World, camera_world());
        assert_eq!(model.transform.translation, Vec3::X);
    }
}
