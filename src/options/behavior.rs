use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::util::easing::EasingFunction;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Behavior", inline)]
#[serde(default)]
/// Framing, zoom, tween and auto-rotation constants.
pub struct BehaviorOptions {
    /// Largest model dimension after normalization, in world units.
    #[schemars(title = "Model Size", range(min = 0.1, max = 10.0), extend("step" = 0.1))]
    pub normalized_size: f32,
    /// Multiplier on the fitting distance when framing a model.
    #[schemars(title = "Fit Margin", range(min = 1.0, max = 3.0), extend("step" = 0.05))]
    pub fit_distance_margin: f32,
    /// Vertical eye lift when framing, as a fraction of the largest dimension.
    #[schemars(skip)]
    pub fit_height_factor: f32,
    /// Distance multiplier for a zoom-in step.
    #[schemars(skip)]
    pub zoom_in_factor: f32,
    /// Distance multiplier for a zoom-out step.
    #[schemars(skip)]
    pub zoom_out_factor: f32,
    /// Camera tween duration in seconds.
    #[schemars(title = "Transition", range(min = 0.0, max = 3.0), extend("step" = 0.05))]
    pub tween_duration: f32,
    /// Camera tween curve.
    #[schemars(skip)]
    pub tween_easing: EasingFunction,
    /// Auto-rotation speed in radians per second.
    #[schemars(title = "Spin Speed", range(min = 0.0, max = 3.0), extend("step" = 0.05))]
    pub auto_rotate_speed: f32,
    /// Whether auto-rotation starts enabled.
    #[schemars(title = "Auto-rotate")]
    pub auto_rotate: bool,
}

impl Default for BehaviorOptions {
    fn default() -> Self {
        Self {
            normalized_size: 1.6,
            fit_distance_margin: 1.35,
            fit_height_factor: 0.2,
            zoom_in_factor: 0.85,
            zoom_out_factor: 1.15,
            tween_duration: 0.5,
            tween_easing: EasingFunction::CubicOut,
            auto_rotate_speed: 0.6,
            auto_rotate: false,
        }
    }
}
