use glam::{Mat4, Quat, Vec3};

/// Translation / rotation / scale, composed as `T * R * S`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Translation.
    pub translation: Vec3,
    /// Rotation.
    pub rotation: Quat,
    /// Non-uniform scale.
    pub scale: Vec3,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Compose into a matrix.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale,
            self.rotation,
            self.translation,
        )
    }

    /// Decompose an affine matrix. Shear is discarded.
    #[must_use]
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) =
            matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation: rotation.normalize(),
            scale,
        }
    }

    /// Rotate about the local Y axis.
    pub fn rotate_local_y(&mut self, angle: f32) {
        self.rotation = (self.rotation * Quat::from_rotation_y(angle)).normalize();
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn matrix_round_trip() {
        let t = Transform {
            translation: Vec3::new(1.0, -2.0, 0.5),
            rotation: Quat::from_euler(glam::EulerRot::YXZ, 0.4, -0.3, 0.2),
            scale: Vec3::splat(1.7),
        };
        let back = Transform::from_matrix(t.matrix());
        assert_relative_eq!(back.translation.x, t.translation.x, epsilon = 1e-5);
        assert_relative_eq!(back.translation.y, t.translation.y, epsilon = 1e-5);
        assert_relative_eq!(back.scale.x, 1.7, epsilon = 1e-5);
        assert!(back.rotation.dot(t.rotation).abs() > 0.99999);
    }

    #[test]
    fn local_y_rotation_keeps_translation() {
        let mut t = Transform {
            translation: Vec3::new(0.0, 1.0, 0.0),
            ..Transform::IDENTITY
        };
        t.rotate_local_y(0.6);
        assert_eq!(t.translation, Vec3::new(0.0, 1.0, 0.0));
        let forward = t.rotation * Vec3::Z;
        assert_relative_eq!(forward.x, 0.6_f32.sin(), epsilon = 1e-5);
    }
}
