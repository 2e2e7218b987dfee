use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Lighting", inline)]
#[serde(default)]
/// One ambient term plus a key and a fill directional light.
pub struct LightingOptions {
    /// Ambient light intensity.
    #[schemars(title = "Ambient", range(min = 0.0, max = 2.0), extend("step" = 0.01))]
    pub ambient: f32,
    /// Key light intensity.
    #[schemars(title = "Key Light", range(min = 0.0, max = 3.0), extend("step" = 0.05))]
    pub key_intensity: f32,
    /// Key light position; the light shines from here toward the origin.
    #[schemars(skip)]
    pub key_position: [f32; 3],
    /// Fill light intensity.
    #[schemars(title = "Fill Light", range(min = 0.0, max = 3.0), extend("step" = 0.05))]
    pub fill_intensity: f32,
    /// Fill light position.
    #[schemars(skip)]
    pub fill_position: [f32; 3],
    /// Shared light color.
    #[schemars(skip)]
    pub color: [f32; 3],
}

impl Default for LightingOptions {
    fn default() -> Self {
        Self {
            ambient: 0.7,
            key_intensity: 0.8,
            key_position: [2.0, 3.0, 2.0],
            fill_intensity: 0.5,
            fill_position: [-2.0, 1.5, -1.0],
            color: [1.0, 1.0, 1.0],
        }
    }
}
