use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::media::FacingMode;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[schemars(title = "Capture", inline)]
#[serde(default)]
/// Which capture device feeds the camera background.
pub struct CaptureOptions {
    /// Preferred camera facing.
    #[schemars(skip)]
    pub facing: FacingMode,
    /// Device name or path (`/dev/video0`, `0`, `video=Integrated Camera`).
    /// `None` picks the platform default.
    #[schemars(skip)]
    pub device: Option<String>,
    /// libavdevice input format (`v4l2`, `avfoundation`, `dshow`).
    /// `None` picks the platform default.
    #[schemars(skip)]
    pub format: Option<String>,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            device: None,
            format: None,
        }
    }
}
