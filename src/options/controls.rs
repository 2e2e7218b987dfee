use std::f32::consts::PI;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Controls", inline)]
#[serde(default)]
/// Orbit-controls limits and sensitivities.
pub struct ControlsOptions {
    /// Whether rotate/pan/dolly deltas decay over several frames.
    #[schemars(title = "Damping")]
    pub enable_damping: bool,
    /// Fraction of the pending delta applied per update.
    #[schemars(title = "Damping Factor", range(min = 0.01, max = 0.5), extend("step" = 0.01))]
    pub damping_factor: f32,
    /// Allow panning the orbit target.
    #[schemars(title = "Pan")]
    pub enable_pan: bool,
    /// Closest allowed eye-to-target distance.
    #[schemars(skip)]
    pub min_distance: f32,
    /// Farthest allowed eye-to-target distance.
    #[schemars(skip)]
    pub max_distance: f32,
    /// Smallest polar angle from +Y, in radians.
    #[schemars(skip)]
    pub min_polar_angle: f32,
    /// Largest polar angle from +Y, in radians.
    #[schemars(skip)]
    pub max_polar_angle: f32,
    /// Rotation sensitivity multiplier.
    #[schemars(title = "Rotate Speed", range(min = 0.1, max = 2.0), extend("step" = 0.05))]
    pub rotate_speed: f32,
    /// Pan sensitivity multiplier.
    #[schemars(title = "Pan Speed", range(min = 0.1, max = 2.0), extend("step" = 0.05))]
    pub pan_speed: f32,
    /// Dolly sensitivity multiplier.
    #[schemars(title = "Zoom Speed", range(min = 0.1, max = 3.0), extend("step" = 0.05))]
    pub zoom_speed: f32,
}

impl Default for ControlsOptions {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.06,
            enable_pan: true,
            min_distance: 0.3,
            max_distance: 50.0,
            min_polar_angle: PI * 0.15,
            max_polar_angle: PI * 0.95,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}
