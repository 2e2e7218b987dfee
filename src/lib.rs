// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::private_intra_doc_links)]
#![warn(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![warn(unused_results)]
#![warn(unused_qualifications)]
// Cast hygiene
#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]

//! GPU-accelerated 3D model showcase built on wgpu.
//!
//! Vitrine pairs a horizontal carousel of catalog entries with an
//! interactive glTF viewport: orbit controls, auto-rotation, animated
//! zoom and framing, a live device-camera background, and a mode that
//! pins the model to the screen while the camera moves.
//!
//! # Key entry points
//!
//! - [`viewer::Viewer`] - camera, controls, current model, flags and the
//!   render loop lifecycle (GPU-free, fully testable)
//! - [`carousel::Carousel`] - selectable cards with a selection callback
//! - [`catalog::Catalog`] - the list of models to browse
//! - [`renderer::SceneRenderer`] - wgpu passes drawing the viewer state
//! - `app::App` (feature `gui`) - the window that wires everything together
//!
//! # Architecture
//!
//! Assets are fetched and parsed on a background
//! [`asset::loader::AssetLoader`] thread; the main thread only attaches
//! finished models and uploads them to the GPU. Device-camera frames are
//! decoded on their own thread behind the [`media::CaptureDevice`] trait.
//! The main thread owns all scene state and drives it once per frame
//! through [`viewer::Viewer::advance`].

#[cfg(feature = "gui")]
pub mod app;
pub mod asset;
pub mod camera;
pub mod carousel;
pub mod catalog;
pub mod error;
#[cfg(feature = "gui")]
mod gui;
pub mod gpu;
pub mod input;
pub mod media;
pub mod options;
pub mod renderer;
pub mod scene;
pub mod util;
pub mod viewer;

#[cfg(feature = "gui")]
pub use app::App;
pub use carousel::Carousel;
pub use catalog::{Catalog, CatalogItem};
pub use error::VitrineError;
pub use input::{InputEvent, InputProcessor, MouseButton};
pub use options::Options;
pub use viewer::{Viewer, ViewerCommand};
