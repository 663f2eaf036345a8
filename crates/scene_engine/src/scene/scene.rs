//! Scene: entity list, component storage and camera registry

use super::{GameObject, SceneId};
use crate::ecs::{Camera, ComponentManager, Entity};
use crate::foundation::time::FrameTime;
use log::{debug, info, warn};

/// A set of entities updated together
///
/// Entities are listed in registration order. Destroying an entity detaches its
/// components right away, but the entity only leaves the list at the end of the
/// current (or next) [`Scene::update`], so code iterating the list mid-frame never
/// sees it shift.
pub struct Scene {
    id: SceneId,
    name: String,
    entities: Vec<Entity>,
    pending_removal: Vec<Entity>,
    components: ComponentManager,
    main_camera: Option<Entity>,
    started: bool,
}

impl Scene {
    pub(crate) fn new(id: SceneId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            entities: Vec::new(),
            pending_removal: Vec::new(),
            components: ComponentManager::new(),
            main_camera: None,
            started: false,
        }
    }

    /// Scene identifier
    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Scene name, unique within its manager
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether [`Scene::start`] has run
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Registered entities, in registration order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Number of registered entities, including those awaiting removal
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Whether `entity` is registered and not destroyed
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity) && !self.pending_removal.contains(&entity)
    }

    /// Component storage
    pub fn components(&self) -> &ComponentManager {
        &self.components
    }

    /// Component storage, mutably
    pub fn components_mut(&mut self) -> &mut ComponentManager {
        &mut self.components
    }

    /// Create an entity with its Transform and register it
    pub fn create_entity(&mut self) -> Entity {
        let entity = Entity::new(self.id);
        self.components.spawn(entity);
        self.entities.push(entity);
        debug!("Created {} in scene '{}'", entity, self.name);
        entity
    }

    /// Create an entity and return a handle for configuring it
    pub fn create_game_object(&mut self) -> GameObject<'_> {
        let entity = self.create_entity();
        GameObject::new(self, entity)
    }

    /// Handle to an existing entity
    pub fn entity(&mut self, entity: Entity) -> Option<GameObject<'_>> {
        if self.components.contains_entity(entity) {
            Some(GameObject::new(self, entity))
        } else {
            None
        }
    }

    /// Append `entity` to the entity list
    ///
    /// Idempotent. Entities of other scenes are rejected. An entity destroyed since the
    /// last update is revived with a new Transform. Returns whether anything changed.
    pub fn register_entity(&mut self, entity: Entity) -> bool {
        if entity.scene() != self.id {
            warn!("Cannot register {} in scene '{}': it belongs to another scene", entity, self.name);
            return false;
        }
        if let Some(index) = self.pending_removal.iter().position(|&other| other == entity) {
            // Destroyed earlier this frame but still listed: bring it back with a fresh Transform
            self.pending_removal.remove(index);
            self.components.spawn(entity);
            self.sync_entities();
            debug!("Re-registered {} in scene '{}' before its removal flushed", entity, self.name);
            return true;
        }
        if self.entities.contains(&entity) {
            return false;
        }
        self.components.spawn(entity);
        self.entities.push(entity);
        self.sync_entities();
        true
    }

    /// Detach every component of `entity` now and drop it from the list at the end of
    /// the update
    pub fn unregister_entity(&mut self, entity: Entity) {
        if !self.entities.contains(&entity) || self.pending_removal.contains(&entity) {
            return;
        }
        self.components.despawn(entity);
        self.pending_removal.push(entity);
        if self.main_camera == Some(entity) {
            self.main_camera = None;
        }
        debug!("Destroyed {} in scene '{}'", entity, self.name);
        self.sync_entities();
    }

    /// Destroy an entity; same as [`Scene::unregister_entity`]
    pub fn destroy_entity(&mut self, entity: Entity) {
        self.unregister_entity(entity);
    }

    /// Wake every component; runs once
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        info!("Starting scene '{}' with {} entities", self.name, self.entities.len());
        self.components.wake_all();
        self.sync_entities();
        // Not inside a frame yet, so entities destroyed during awake leave the list now
        self.flush_removals();
    }

    /// Run one frame
    ///
    /// Starts the scene first if needed. Entities created or destroyed by components
    /// during the frame are folded into the entity list before pending removals flush.
    pub fn update(&mut self, time: FrameTime) {
        if !self.started {
            debug!("Scene '{}' updated before start, starting now", self.name);
            self.start();
        }

        self.components.update_all(time);
        self.sync_entities();
        self.flush_removals();
    }

    /// Fold entities created or destroyed by component hooks into the entity list
    ///
    /// Destroyed entities are only marked for removal; the list shrinks in
    /// [`Scene::flush_removals`].
    pub(crate) fn sync_entities(&mut self) {
        for entity in std::mem::take(&mut self.components.spawned) {
            if self.components.contains_entity(entity) && !self.entities.contains(&entity) {
                self.entities.push(entity);
            }
        }
        for entity in std::mem::take(&mut self.components.despawned) {
            if self.entities.contains(&entity) && !self.pending_removal.contains(&entity) {
                self.pending_removal.push(entity);
            }
            if self.main_camera == Some(entity) {
                self.main_camera = None;
            }
        }
    }

    fn flush_removals(&mut self) {
        if self.pending_removal.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending_removal);
        self.entities.retain(|entity| !pending.contains(entity));
        debug!("Scene '{}' removed {} entities", self.name, pending.len());
    }

    // ------------------------------------------------------------------
    // Cameras
    // ------------------------------------------------------------------

    /// Make `entity` the main camera; it must carry a [`Camera`]
    pub fn set_main_camera(&mut self, entity: Entity) -> bool {
        if !self.components.has::<Camera>(entity) {
            warn!("Cannot use {} as main camera: it has no Camera component", entity);
            return false;
        }
        self.main_camera = Some(entity);
        true
    }

    /// The main camera, or the first camera in the scene if none was chosen
    pub fn main_camera(&self) -> Option<Entity> {
        self.main_camera
            .filter(|&entity| self.components.has::<Camera>(entity))
            .or_else(|| self.cameras().first().copied())
    }

    /// Every entity carrying a [`Camera`], in insertion order
    pub fn cameras(&self) -> Vec<Entity> {
        self.components.iter::<Camera>().map(|(entity, _)| entity).collect()
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("entities", &self.entities.len())
            .field("components", &self.components.len())
            .field("started", &self.started)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Component, ComponentContext, Transform};

    fn scene() -> Scene {
        Scene::new(SceneId::default(), "test")
    }

    #[derive(Default)]
    struct Suicidal;

    impl Component for Suicidal {
        fn update(&mut self, ctx: &mut ComponentContext<'_>) {
            let entity = ctx.entity();
            ctx.destroy_entity(entity);
        }
    }

    #[derive(Default)]
    struct Breeder {
        spawned: bool,
    }

    impl Component for Breeder {
        fn update(&mut self, ctx: &mut ComponentContext<'_>) {
            if !self.spawned {
                self.spawned = true;
                ctx.spawn_entity();
            }
        }
    }

    #[test]
    fn test_create_entity_has_transform() {
        let mut scene = scene();
        let entity = scene.create_entity();

        assert_eq!(scene.entities(), &[entity]);
        assert!(scene.components().has::<Transform>(entity));
        assert_eq!(entity.scene(), scene.id());
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut scene = scene();
        let entity = scene.create_entity();

        assert!(!scene.register_entity(entity));
        assert_eq!(scene.entity_count(), 1);
    }

    #[test]
    fn test_unregister_defers_list_removal() {
        let mut scene = scene();
        let entity = scene.create_entity();
        scene.start();

        scene.unregister_entity(entity);

        assert!(!scene.components().has::<Transform>(entity));
        assert_eq!(scene.entity_count(), 1);
        assert!(!scene.contains(entity));

        scene.update(FrameTime::default());
        assert_eq!(scene.entity_count(), 0);
    }

    #[test]
    fn test_update_starts_scene() {
        let mut scene = scene();
        assert!(!scene.is_started());

        scene.update(FrameTime::default());

        assert!(scene.is_started());
        assert!(scene.components().is_started());
    }

    #[test]
    fn test_entities_created_and_destroyed_by_components() {
        let mut scene = scene();
        let breeder = scene.create_entity();
        scene.components_mut().add::<Breeder>(breeder);
        let doomed = scene.create_entity();
        scene.components_mut().add::<Suicidal>(doomed);

        scene.update(FrameTime::default());

        assert_eq!(scene.entity_count(), 2);
        assert!(scene.contains(breeder));
        assert!(!scene.contains(doomed));
    }

    #[test]
    fn test_main_camera_falls_back_to_first_camera() {
        let mut scene = scene();
        let plain = scene.create_entity();
        assert!(!scene.set_main_camera(plain));
        assert_eq!(scene.main_camera(), None);

        let first = scene.create_entity();
        scene.components_mut().add::<Camera>(first);
        let second = scene.create_entity();
        scene.components_mut().add::<Camera>(second);

        assert_eq!(scene.main_camera(), Some(first));
        assert!(scene.set_main_camera(second));
        assert_eq!(scene.main_camera(), Some(second));
        assert_eq!(scene.cameras(), vec![first, second]);

        scene.destroy_entity(second);
        assert_eq!(scene.main_camera(), Some(first));
    }

    /// Spawns one entity and destroys its own during awake
    #[derive(Default)]
    struct Founder {
        spawned: Option<Entity>,
    }

    impl Component for Founder {
        fn awake(&mut self, ctx: &mut ComponentContext<'_>) {
            self.spawned = Some(ctx.spawn_entity());
        }
    }

    #[derive(Default)]
    struct Stillborn;

    impl Component for Stillborn {
        fn awake(&mut self, ctx: &mut ComponentContext<'_>) {
            let entity = ctx.entity();
            ctx.destroy_entity(entity);
        }
    }

    #[test]
    fn test_start_folds_entities_changed_during_awake() {
        let mut scene = scene();
        let founder = scene.create_entity();
        scene.components_mut().add::<Founder>(founder);
        let doomed = scene.create_entity();
        scene.components_mut().add::<Stillborn>(doomed);

        scene.start();

        let spawned = scene.components().get::<Founder>(founder).unwrap().spawned.unwrap();
        assert_eq!(scene.entities(), &[founder, spawned]);
        assert_eq!(scene.entity_count(), 2);
        assert!(scene.contains(spawned));
        assert!(!scene.contains(doomed));
        assert!(scene.components().has::<Transform>(spawned));
    }

    #[test]
    fn test_add_after_start_folds_entities_changed_during_awake() {
        let mut scene = scene();
        scene.start();
        let founder = scene.create_game_object().with(Founder::default()).entity();
        let doomed = scene.create_game_object().with(Stillborn).entity();

        let spawned = scene.components().get::<Founder>(founder).unwrap().spawned.unwrap();
        assert!(scene.contains(spawned));
        assert!(scene.entities().contains(&spawned));
        assert!(!scene.contains(doomed));

        scene.update(FrameTime::default());
        assert_eq!(scene.entities(), &[founder, spawned]);
    }

    #[test]
    fn test_register_revives_entity_awaiting_removal() {
        let mut scene = scene();
        let entity = scene.create_entity();
        scene.start();

        scene.unregister_entity(entity);
        assert!(scene.register_entity(entity));
        assert!(scene.contains(entity));
        assert!(scene.components().has::<Transform>(entity));

        scene.update(FrameTime::default());

        assert_eq!(scene.entities(), &[entity]);
        assert!(scene.contains(entity));
        assert!(scene.components().contains_entity(entity));
        assert!(!scene.register_entity(entity));
    }
}
