//! The displayed model and the spatial types it is built from.
//!
//! The viewer holds at most one [`Model`]. Its [`Transform`] is expressed
//! either in world space or, while locked to the screen, in camera space
//! (see [`Attachment`]).

pub mod bounds;
pub mod model;
pub mod transform;

pub use bounds::Aabb;
pub use model::{Attachment, Model, ModelId};
pub use transform::Transform;
