//! Rendering interface
//!
//! The engine core does not own a graphics backend. Renderers plug in as
//! [`RenderPass`]es that read committed scene state once per drawn frame.

pub mod render_pass;

pub use render_pass::{RenderPass, RenderPassController};
