//! Built-in components
//!
//! Every entity carries a [`Transform`]; [`Camera`] is optional.

pub mod camera;
pub mod transform;

pub use camera::{Camera, Projection};
pub use transform::Transform;
