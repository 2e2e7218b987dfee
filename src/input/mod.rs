//! Input handling: event types, click/drag tracking, and the processor
//! that converts raw window events into viewer commands.

/// Platform-agnostic input events.
pub mod event;
/// Drag and double-click tracking.
pub(crate) mod mouse;
/// Converts raw events into viewer commands.
pub mod processor;

pub use event::{InputEvent, MouseButton};
pub use processor::{InputProcessor, KeyBindings, KeyCommandTag};
