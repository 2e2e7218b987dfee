//! Easing curves for camera transitions.
//!
//! All curves map `[0, 1]` onto `[0, 1]` with `f(0) = 0` and `f(1) = 1`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Easing function variants for camera tweens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EasingFunction {
    /// Linear interpolation (no easing).
    Linear,
    /// Quadratic ease-out (fast start, slow end).
    QuadraticOut,
    /// Cubic ease-out: `1 - (1 - t)³`.
    CubicOut,
}

impl EasingFunction {
    /// Default easing used by camera moves.
    pub const DEFAULT: EasingFunction = EasingFunction::CubicOut;

    /// Evaluate the easing function at time t.
    ///
    /// Input t is clamped to [0.0, 1.0].
    #[inline]
    #[must_use]
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            EasingFunction::Linear => t,
            EasingFunction::QuadraticOut => {
                let omt = 1.0 - t;
                1.0 - omt * omt
            }
            EasingFunction::CubicOut => {
                let omt = 1.0 - t;
                1.0 - omt * omt * omt
            }
        }
    }
}

impl Default for EasingFunction {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_endpoints() {
        let linear = EasingFunction::Linear;
        assert_eq!(linear.evaluate(0.0), 0.0);
        assert_eq!(linear.evaluate(0.5), 0.5);
        assert_eq!(linear.evaluate(1.0), 1.0);
    }

    #[test]
    fn test_cubic_out_endpoints_and_midpoint() {
        let cubic = EasingFunction::CubicOut;
        assert_eq!(cubic.evaluate(0.0), 0.0);
        assert_eq!(cubic.evaluate(1.0), 1.0);
        // 1 - 0.5³ = 0.875
        assert!((cubic.evaluate(0.5) - 0.875).abs() < 1e-6);
    }

    #[test]
    fn test_cubic_out_is_monotonic() {
        let cubic = EasingFunction::CubicOut;
        let mut prev = 0.0;
        for i in 1..=20 {
            let v = cubic.evaluate(i as f32 / 20.0);
            assert!(v >= prev, "not monotonic at step {i}");
            prev = v;
        }
    }

    #[test]
    fn test_input_clamping() {
        let linear = EasingFunction::Linear;
        assert_eq!(linear.evaluate(-0.5), 0.0);
        assert_eq!(linear.evaluate(1.5), 1.0);

        let cubic = EasingFunction::CubicOut;
        assert_eq!(cubic.evaluate(-0.5), 0.0);
        assert_eq!(cubic.evaluate(1.5), 1.0);
    }

    #[test]
    fn test_quadratic_out() {
        let quad_out = EasingFunction::QuadraticOut;
        assert_eq!(quad_out.evaluate(0.0), 0.0);
        assert_eq!(quad_out.evaluate(0.5), 0.75);
        assert_eq!(quad_out.evaluate(1.0), 1.0);
    }

    #[test]
    fn test_default_is_cubic_out() {
        assert_eq!(EasingFunction::default(), EasingFunction::CubicOut);
    }
}
