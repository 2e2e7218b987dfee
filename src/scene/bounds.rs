use glam::{Mat4, Vec3};

/// Axis-aligned bounding box. An empty box has `min > max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// A box containing nothing; extending it with a point yields that point.
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Smallest box containing all `points`.
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut acc, p| {
            acc.extend(p);
            acc
        })
    }

    /// Whether the box contains no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
            || self.min.y > self.max.y
            || self.min.z > self.max.z
    }

    /// Grow to include `point`.
    pub fn extend(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Smallest box containing both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Center point (zero for an empty box).
    #[must_use]
    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }

    /// Edge lengths (zero for an empty box).
    #[must_use]
    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    /// Longest edge.
    #[must_use]
    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }

    /// Box around the eight corners after `matrix` is applied.
    #[must_use]
    pub fn transformed(&self, matrix: Mat4) -> Self {
        if self.is_empty() {
            return *self;
        }
        let (lo, hi) = (self.min, self.max);
        Self::from_points((0..8).map(|i| {
            let corner = Vec3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            );
            matrix.transform_point3(corner)
        }))
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn empty_box_reports_zero_size() {
        assert!(Aabb::EMPTY.is_empty());
        assert_eq!(Aabb::EMPTY.size(), Vec3::ZERO);
        assert_eq!(Aabb::EMPTY.max_dimension(), 0.0);
    }

    #[test]
    fn from_points_and_center() {
        let b = Aabb::from_points([
            Vec3::new(-1.0, 0.0, 2.0),
            Vec3::new(3.0, 4.0, -2.0),
        ]);
        assert_eq!(b.center(), Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(b.max_dimension(), 4.0);
    }

    #[test]
    fn rotation_grows_the_box() {
        let b = Aabb::from_points([Vec3::splat(-1.0), Vec3::splat(1.0)]);
        let rotated = b.transformed(Mat4::from_rotation_y(
            std::f32::consts::FRAC_PI_4,
        ));
        assert_relative_eq!(rotated.max.x, 2.0_f32.sqrt(), epsilon = 1e-5);
        assert_relative_eq!(rotated.max.y, 1.0, epsilon = 1e-5);
    }
}
