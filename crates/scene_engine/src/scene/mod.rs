//! Scenes and the scene registry
//!
//! A [`Scene`] owns its entities and their components. The [`SceneManager`] owns the
//! scenes and tracks which one is active; there is no global scene state.

#[allow(clippy::module_inception)]
pub mod scene;
pub mod game_object;
pub mod scene_manager;

pub use game_object::GameObject;
pub use scene::Scene;
pub use scene_manager::{SceneError, SceneManager};

slotmap::new_key_type! {
    /// Stable identifier of a scene inside its [`SceneManager`]
    pub struct SceneId;
}
