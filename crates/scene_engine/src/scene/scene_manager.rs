//! # Scene Manager
//!
//! Registry of every scene plus the single active one. The manager is an explicit
//! value owned by the frame driver and passed to whoever needs it.

use super::{Scene, SceneId};
use crate::foundation::time::FrameTime;
use log::{debug, info};
use slotmap::SlotMap;
use thiserror::Error;

/// Scene registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// No scene is active
    #[error("No active scene")]
    NoActiveScene,

    /// The id does not name a registered scene
    #[error("Scene not found: {0:?}")]
    SceneNotFound(SceneId),

    /// Another scene already uses the name
    #[error("Scene name already in use: {0}")]
    DuplicateSceneName(String),
}

/// Owner of all scenes
#[derive(Debug, Default)]
pub struct SceneManager {
    scenes: SlotMap<SceneId, Scene>,
    /// Creation order, for stable iteration
    order: Vec<SceneId>,
    active: Option<SceneId>,
    anonymous_count: usize,
}

impl SceneManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered scenes
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Create a scene; unnamed scenes are called `"Scene {n}"`
    pub fn create_scene(&mut self, name: Option<&str>) -> Result<SceneId, SceneError> {
        let name = match name {
            Some(name) => {
                if self.get_scene_by_name(name).is_some() {
                    return Err(SceneError::DuplicateSceneName(name.to_string()));
                }
                name.to_string()
            }
            None => loop {
                self.anonymous_count += 1;
                let candidate = format!("Scene {}", self.anonymous_count);
                if self.get_scene_by_name(&candidate).is_none() {
                    break candidate;
                }
            },
        };

        let id = self.scenes.insert_with_key(|id| Scene::new(id, name));
        self.order.push(id);
        debug!("Created scene '{}'", self.scenes[id].name());
        Ok(id)
    }

    /// Look up a scene
    pub fn get_scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.get(id)
    }

    /// Look up a scene mutably
    pub fn get_scene_mut(&mut self, id: SceneId) -> Option<&mut Scene> {
        self.scenes.get_mut(id)
    }

    /// Look up a scene by name
    pub fn get_scene_by_name(&self, name: &str) -> Option<&Scene> {
        self.scenes.values().find(|scene| scene.name() == name)
    }

    /// Every scene, in creation order
    pub fn get_all_scenes(&self) -> impl Iterator<Item = &Scene> + '_ {
        self.order.iter().filter_map(|&id| self.scenes.get(id))
    }

    /// Make `id` the active scene
    pub fn set_active_scene(&mut self, id: SceneId) -> Result<(), SceneError> {
        let scene = self.scenes.get(id).ok_or(SceneError::SceneNotFound(id))?;
        info!("Active scene: '{}'", scene.name());
        self.active = Some(id);
        Ok(())
    }

    /// Id of the active scene
    pub fn active_scene_id(&self) -> Option<SceneId> {
        self.active
    }

    /// The active scene
    pub fn get_active_scene(&self) -> Result<&Scene, SceneError> {
        self.active
            .and_then(|id| self.scenes.get(id))
            .ok_or(SceneError::NoActiveScene)
    }

    /// The active scene, mutably
    pub fn get_active_scene_mut(&mut self) -> Result<&mut Scene, SceneError> {
        self.active
            .and_then(|id| self.scenes.get_mut(id))
            .ok_or(SceneError::NoActiveScene)
    }

    /// Remove a scene and hand it back; clears the active scene if it was this one
    pub fn unregister_scene(&mut self, id: SceneId) -> Result<Scene, SceneError> {
        let scene = self.scenes.remove(id).ok_or(SceneError::SceneNotFound(id))?;
        self.order.retain(|&other| other != id);
        if self.active == Some(id) {
            self.active = None;
        }
        debug!("Unregistered scene '{}'", scene.name());
        Ok(scene)
    }

    /// Run one frame of the active scene
    pub fn update_active(&mut self, time: FrameTime) -> Result<(), SceneError> {
        self.get_active_scene_mut()?.update(time);
        Ok(())
    }
}
