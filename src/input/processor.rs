//! Converts raw platform events into viewer commands.
//!
//! The `InputProcessor` owns all transient input state (mouse tracking,
//! drag detection, double-click timing, modifier keys) and the key-binding
//! map. It is the only thing that sits between raw window events and
//! [`Viewer::execute`](crate::Viewer::execute).

use std::collections::HashMap;
use std::time::Instant;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::event::{InputEvent, MouseButton};
use super::mouse::{ClickResult, InputState};
use crate::viewer::ViewerCommand;

/// Maps physical key strings to [`ViewerCommand`] variants.
///
/// Key strings use the `winit::keyboard::KeyCode` debug format:
/// `"KeyF"`, `"ArrowLeft"`, `"Equal"`, etc.
///
/// ```toml
/// [keybindings.bindings]
/// KeyF = "fit_to_view"
/// Space = "toggle_auto_rotate"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KeyBindings {
    /// Forward map: key string → command tag.
    bindings: HashMap<String, KeyCommandTag>,
}

/// Serializable tag for the subset of [`ViewerCommand`] that can be
/// key-bound (discrete, parameterless actions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCommandTag {
    /// Frame the model.
    FitToView,
    /// Step the camera closer.
    ZoomIn,
    /// Step the camera away.
    ZoomOut,
    /// Toggle auto-rotation.
    ToggleAutoRotate,
    /// Toggle lock-to-screen.
    ToggleLock,
    /// Toggle the camera background.
    ToggleCameraBackground,
    /// Previous carousel card.
    CarouselPrev,
    /// Next carousel card.
    CarouselNext,
}

impl KeyCommandTag {
    fn to_command(self) -> ViewerCommand {
        match self {
            Self::FitToView => ViewerCommand::FitToView,
            Self::ZoomIn => ViewerCommand::ZoomIn,
            Self::ZoomOut => ViewerCommand::ZoomOut,
            Self::ToggleAutoRotate => ViewerCommand::ToggleAutoRotate,
            Self::ToggleLock => ViewerCommand::ToggleLock,
            Self::ToggleCameraBackground => ViewerCommand::ToggleCameraBackground,
            Self::CarouselPrev => ViewerCommand::CarouselPrev,
            Self::CarouselNext => ViewerCommand::CarouselNext,
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let bindings = HashMap::from([
            ("ArrowLeft".into(), KeyCommandTag::CarouselPrev),
            ("ArrowRight".into(), KeyCommandTag::CarouselNext),
            ("KeyF".into(), KeyCommandTag::FitToView),
            ("KeyR".into(), KeyCommandTag::ToggleAutoRotate),
            ("Equal".into(), KeyCommandTag::ZoomIn),
            ("Minus".into(), KeyCommandTag::ZoomOut),
            ("KeyL".into(), KeyCommandTag::ToggleLock),
            ("KeyC".into(), KeyCommandTag::ToggleCameraBackground),
        ]);
        Self { bindings }
    }
}

impl KeyBindings {
    /// Look up the command for a physical key string.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<ViewerCommand> {
        self.bindings.get(key).map(|tag| tag.to_command())
    }

    /// Bind `key` to `tag`, replacing any existing binding for that key.
    pub fn bind(&mut self, key: impl Into<String>, tag: KeyCommandTag) {
        let _ = self.bindings.insert(key.into(), tag);
    }
}

/// Converts raw window events into [`ViewerCommand`]s.
///
/// # Usage
///
/// ```ignore
/// if let Some(cmd) = input.handle_event(event) {
///     viewer.execute(cmd);
/// }
/// if let Some(cmd) = input.handle_key_press("KeyF") {
///     viewer.execute(cmd);
/// }
/// ```
pub struct InputProcessor {
    state: InputState,
    /// Button currently held, if any.
    pressed: Option<MouseButton>,
    shift_pressed: bool,
    key_bindings: KeyBindings,
}

impl InputProcessor {
    /// Create a new processor with default key bindings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: InputState::new(),
            pressed: None,
            shift_pressed: false,
            key_bindings: KeyBindings::default(),
        }
    }

    /// Create a processor with custom key bindings.
    #[must_use]
    pub fn with_key_bindings(key_bindings: KeyBindings) -> Self {
        Self {
            key_bindings,
            ..Self::new()
        }
    }

    /// Current cursor position in physical pixels.
    #[must_use]
    pub fn mouse_pos(&self) -> (f32, f32) {
        self.state.mouse_pos
    }

    /// Read-only access to the key bindings.
    #[must_use]
    pub fn key_bindings(&self) -> &KeyBindings {
        &self.key_bindings
    }

    /// Drop any held button, e.g. when the overlay captures the pointer
    /// mid-drag.
    pub fn release_mouse_state(&mut self) {
        self.pressed = None;
    }

    /// Look up a key press and return the corresponding command, if bound.
    #[must_use]
    pub fn handle_key_press(&self, key: &str) -> Option<ViewerCommand> {
        self.key_bindings.lookup(key)
    }

    /// Process a raw input event and return zero or one commands.
    pub fn handle_event(&mut self, event: InputEvent) -> Option<ViewerCommand> {
        self.handle_event_at(event, Instant::now())
    }

    fn handle_event_at(
        &mut self,
        event: InputEvent,
        now: Instant,
    ) -> Option<ViewerCommand> {
        match event {
            InputEvent::CursorMoved { x, y } => self.handle_cursor_moved(x, y),
            InputEvent::MouseButton { button, pressed } => {
                self.handle_mouse_button(button, pressed, now)
            }
            InputEvent::Scroll { delta } => {
                (delta != 0.0).then_some(ViewerCommand::Dolly { amount: delta })
            }
            InputEvent::ModifiersChanged { shift } => {
                self.shift_pressed = shift;
                None
            }
        }
    }

    fn handle_cursor_moved(&mut self, x: f32, y: f32) -> Option<ViewerCommand> {
        let (dx, dy) =
            self.state.handle_mouse_position(x, y, self.pressed.is_some());
        let delta = Vec2::new(dx, dy);
        match self.pressed? {
            MouseButton::Left if !self.shift_pressed => {
                Some(ViewerCommand::RotateCamera { delta })
            }
            MouseButton::Left | MouseButton::Right | MouseButton::Middle => {
                Some(ViewerCommand::PanCamera { delta })
            }
        }
    }

    fn handle_mouse_button(
        &mut self,
        button: MouseButton,
        pressed: bool,
        now: Instant,
    ) -> Option<ViewerCommand> {
        if pressed {
            if self.pressed.is_none() {
                self.pressed = Some(button);
                self.state.handle_mouse_down();
            }
            return None;
        }
        if self.pressed != Some(button) {
            return None;
        }
        self.pressed = None;
        if button != MouseButton::Left {
            return None;
        }
        match self.state.process_mouse_up(now) {
            ClickResult::DoubleClick => Some(ViewerCommand::FitToView),
            ClickResult::SingleClick | ClickResult::NoAction => None,
        }
    }
}

impl Default for InputProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn press(button: MouseButton) -> InputEvent {
        InputEvent::MouseButton {
            button,
            pressed: true,
        }
    }

    fn release(button: MouseButton) -> InputEvent {
        InputEvent::MouseButton {
            button,
            pressed: false,
        }
    }

    #[test]
    fn left_drag_rotates_and_shift_drag_pans() {
        let mut input = InputProcessor::new();
        let _ = input.handle_event(InputEvent::CursorMoved { x: 10.0, y: 10.0 });
        let _ = input.handle_event(press(MouseButton::Left));
        assert_eq!(
            input.handle_event(InputEvent::CursorMoved { x: 15.0, y: 12.0 }),
            Some(ViewerCommand::RotateCamera {
                delta: Vec2::new(5.0, 2.0)
            })
        );
        let _ = input.handle_event(InputEvent::ModifiersChanged { shift: true });
        assert!(matches!(
            input.handle_event(InputEvent::CursorMoved { x: 16.0, y: 12.0 }),
            Some(ViewerCommand::PanCamera { .. })
        ));
    }

    #[test]
    fn right_drag_pans() {
        let mut input = InputProcessor::new();
        let _ = input.handle_event(press(MouseButton::Right));
        assert!(matches!(
            input.handle_event(InputEvent::CursorMoved { x: 3.0, y: 0.0 }),
            Some(ViewerCommand::PanCamera { .. })
        ));
        let _ = input.handle_event(release(MouseButton::Right));
        assert_eq!(
            input.handle_event(InputEvent::CursorMoved { x: 4.0, y: 0.0 }),
            None
        );
    }

    #[test]
    fn double_click_fits_view() {
        let mut input = InputProcessor::new();
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(120);
        assert_eq!(input.handle_event_at(press(MouseButton::Left), t0), None);
        assert_eq!(input.handle_event_at(release(MouseButton::Left), t0), None);
        assert_eq!(input.handle_event_at(press(MouseButton::Left), t1), None);
        assert_eq!(
            input.handle_event_at(release(MouseButton::Left), t1),
            Some(ViewerCommand::FitToView)
        );
    }

    #[test]
    fn scroll_dollies() {
        let mut input = InputProcessor::new();
        assert_eq!(
            input.handle_event(InputEvent::Scroll { delta: 1.5 }),
            Some(ViewerCommand::Dolly { amount: 1.5 })
        );
        assert_eq!(input.handle_event(InputEvent::Scroll { delta: 0.0 }), None);
    }

    #[test]
    fn default_bindings_cover_toolbar_actions() {
        let input = InputProcessor::new();
        assert_eq!(input.handle_key_press("KeyF"), Some(ViewerCommand::FitToView));
        assert_eq!(input.handle_key_press("Minus"), Some(ViewerCommand::ZoomOut));
        assert_eq!(
            input.handle_key_press("ArrowLeft"),
            Some(ViewerCommand::CarouselPrev)
        );
        assert_eq!(input.handle_key_press("KeyQ"), None);
    }

    #[test]
    fn rebinding_replaces_existing_key() {
        let mut bindings = KeyBindings::default();
        bindings.bind("KeyF", KeyCommandTag::ToggleLock);
        let input = InputProcessor::with_key_bindings(bindings);
        assert_eq!(input.handle_key_press("KeyF"), Some(ViewerCommand::ToggleLock));
    }
}
