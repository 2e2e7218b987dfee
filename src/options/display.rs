use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Display", inline)]
#[serde(default)]
/// Background color and floor grid.
pub struct DisplayOptions {
    /// Solid background color (sRGB).
    #[schemars(skip)]
    pub background_color: [f32; 3],
    /// Draw the floor grid.
    #[schemars(title = "Grid")]
    pub show_grid: bool,
    /// Grid edge length in world units.
    #[schemars(skip)]
    pub grid_size: f32,
    /// Number of cells along each grid edge.
    #[schemars(skip)]
    pub grid_divisions: u32,
    /// Color of the two center lines.
    #[schemars(skip)]
    pub grid_center_color: [f32; 3],
    /// Color of the remaining lines.
    #[schemars(skip)]
    pub grid_color: [f32; 3],
    /// Grid opacity.
    #[schemars(title = "Grid Opacity", range(min = 0.0, max = 1.0), extend("step" = 0.05))]
    pub grid_opacity: f32,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            background_color: [1.0, 1.0, 1.0],
            show_grid: true,
            grid_size: 10.0,
            grid_divisions: 10,
            grid_center_color: [0.933, 0.933, 0.933],
            grid_color: [0.961, 0.961, 0.961],
            grid_opacity: 0.6,
        }
    }
}
