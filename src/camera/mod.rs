//! Camera system for 3D model viewing.
//!
//! Provides a perspective camera, damped orbit controls, and the timed
//! tween used for framing and zoom steps.

/// Damped spherical orbit controls.
pub mod controller;
/// Core camera struct and GPU uniform types.
pub mod core;
/// Timed eased camera moves.
pub mod tween;
