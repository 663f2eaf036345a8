//! Entity implementation

use crate::scene::SceneId;
use std::fmt;

/// Entity identifier
///
/// An opaque 128-bit identity plus the scene that owns the entity. Entities are plain
/// `Copy` handles: every component operation goes through the owning scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    id: u128,
    scene: SceneId,
}

impl Entity {
    /// Create an entity with a fresh random identity owned by `scene`
    pub(crate) fn new(scene: SceneId) -> Self {
        Self {
            id: rand::random(),
            scene,
        }
    }

    /// Get the entity ID
    pub fn id(&self) -> u128 {
        self.id
    }

    /// Get the scene that owns this entity
    pub fn scene(&self) -> SceneId {
        self.scene
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell entities apart in logs
        write!(f, "Entity({:08x})", (self.id >> 96) as u32)
    }
}
