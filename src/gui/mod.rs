//! Overlay UI drawn with egui on top of the scene.
//!
//! [`egui_host`] bridges winit input and wgpu painting, [`panel`] lays out
//! the toolbar and carousel, and [`thumbnails`] fetches card images in the
//! background.

pub(crate) mod egui_host;
pub(crate) mod panel;
pub(crate) mod thumbnails;
