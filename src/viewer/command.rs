use glam::Vec2;

/// A discrete action the viewer (or, for the carousel variants, the
/// application around it) can perform.
///
/// Produced by [`InputProcessor`](crate::InputProcessor) from mouse
/// gestures and key bindings, and by the toolbar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerCommand {
    /// Orbit by a screen-space drag (pixels).
    RotateCamera {
        /// Cursor movement since the last event.
        delta: Vec2,
    },
    /// Pan by a screen-space drag (pixels).
    PanCamera {
        /// Cursor movement since the last event.
        delta: Vec2,
    },
    /// Wheel dolly; positive moves closer.
    Dolly {
        /// Scroll amount in lines.
        amount: f32,
    },
    /// Frame the current model.
    FitToView,
    /// Step closer.
    ZoomIn,
    /// Step away.
    ZoomOut,
    /// Flip auto-rotation.
    ToggleAutoRotate,
    /// Flip lock-to-screen.
    ToggleLock,
    /// Flip the camera background.
    ToggleCameraBackground,
    /// Select the previous carousel card.
    CarouselPrev,
    /// Select the next carousel card.
    CarouselNext,
}

impl ViewerCommand {
    /// Whether this command targets the carousel rather than the viewer.
    #[must_use]
    pub fn is_carousel(&self) -> bool {
        matches!(self, Self::CarouselPrev | Self::CarouselNext)
    }
}
