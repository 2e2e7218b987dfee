use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Camera", inline)]
#[serde(default)]
/// Camera projection and starting pose.
pub struct CameraOptions {
    /// Vertical field of view in degrees.
    #[schemars(title = "Field of View", range(min = 20.0, max = 90.0), extend("step" = 1.0))]
    pub fovy: f32,
    /// Near clipping plane distance.
    #[schemars(skip)]
    pub znear: f32,
    /// Far clipping plane distance.
    #[schemars(skip)]
    pub zfar: f32,
    /// Initial eye position.
    #[schemars(skip)]
    pub position: [f32; 3],
    /// Initial orbit target.
    #[schemars(skip)]
    pub target: [f32; 3],
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fovy: 55.0,
            znear: 0.01,
            zfar: 1000.0,
            position: [0.0, 1.2, 2.5],
            target: [0.0, 0.8, 0.0],
        }
    }
}
