//! GPU resource management utilities.
//!
//! Provides wgpu device/surface initialization, texture helpers, and the
//! bind-group/pipeline boilerplate shared by the scene passes.

/// Bind-group layout entries and pipeline constructors.
pub mod pipeline_helpers;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// Depth buffer and sampled RGBA textures.
pub mod texture;
