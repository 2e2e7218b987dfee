//! Timed camera moves.

use glam::Vec3;

use crate::util::easing::EasingFunction;

/// Eye position and look-at target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// Eye position.
    pub eye: Vec3,
    /// Look-at target.
    pub target: Vec3,
}

/// Interpolates the camera from one pose to another over a fixed duration.
///
/// The tween is advanced by frame delta; once `elapsed >= duration` it
/// reports the destination and [`is_finished`](Self::is_finished).
#[derive(Debug, Clone)]
pub struct CameraTween {
    from: CameraPose,
    to: CameraPose,
    duration: f32,
    elapsed: f32,
    easing: EasingFunction,
}

impl CameraTween {
    /// Start a tween at `from`, heading to `to`.
    #[must_use]
    pub fn new(
        from: CameraPose,
        to: CameraPose,
        duration: f32,
        easing: EasingFunction,
    ) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
            easing,
        }
    }

    /// Where the tween ends.
    #[must_use]
    pub fn destination(&self) -> CameraPose {
        self.to
    }

    /// Normalized progress in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    /// Whether the destination has been reached.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    /// Advance by `dt` seconds and return the interpolated pose.
    pub fn advance(&mut self, dt: f32) -> CameraPose {
        self.elapsed += dt.max(0.0);
        self.sample()
    }

    /// Pose at the current progress.
    #[must_use]
    pub fn sample(&self) -> CameraPose {
        let k = self.easing.evaluate(self.progress());
        CameraPose {
            eye: self.from.eye.lerp(self.to.eye, k),
            target: self.from.target.lerp(self.to.target, k),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn pose(eye: [f32; 3], target: [f32; 3]) -> CameraPose {
        CameraPose {
            eye: Vec3::from_array(eye),
            target: Vec3::from_array(target),
        }
    }

    #[test]
    fn reaches_destination_after_duration() {
        let mut tween = CameraTween::new(
            pose([0.0, 0.0, 5.0], [0.0; 3]),
            pose([0.0, 2.0, 3.0], [1.0, 0.0, 0.0]),
            0.5,
            EasingFunction::CubicOut,
        );
        let mut last = tween.sample();
        for _ in 0..10 {
            last = tween.advance(0.06);
        }
        assert!(tween.is_finished());
        assert_eq!(last, tween.destination());
    }

    #[test]
    fn halfway_uses_cubic_ease_out() {
        let mut tween = CameraTween::new(
            pose([0.0; 3], [0.0; 3]),
            pose([8.0, 0.0, 0.0], [0.0; 3]),
            1.0,
            EasingFunction::CubicOut,
        );
        let mid = tween.advance(0.5);
        assert_relative_eq!(mid.eye.x, 7.0, epsilon = 1e-5);
        assert!(!tween.is_finished());
    }

    #[test]
    fn zero_duration_finishes_immediately() {
        let tween = CameraTween::new(
            pose([0.0; 3], [0.0; 3]),
            pose([1.0; 3], [0.0; 3]),
            0.0,
            EasingFunction::Linear,
        );
        assert!(tween.is_finished());
        assert_eq!(tween.sample().eye, Vec3::ONE);
    }
}
