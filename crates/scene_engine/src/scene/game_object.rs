//! Entity handle with component convenience methods

use super::Scene;
use crate::ecs::{Component, ComponentHandle, Entity, TransformMut, TransformRef};

/// An entity together with the scene that owns it
///
/// Borrowing the scene for the lifetime of the handle keeps every call on the right
/// component storage.
pub struct GameObject<'a> {
    scene: &'a mut Scene,
    entity: Entity,
}

impl<'a> GameObject<'a> {
    pub(crate) fn new(scene: &'a mut Scene, entity: Entity) -> Self {
        Self { scene, entity }
    }

    /// The wrapped entity
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Add a default-constructed component, or get the existing one
    pub fn add_component<T: Component + Default>(&mut self) -> Option<ComponentHandle<T>> {
        let handle = self.scene.components_mut().add::<T>(self.entity);
        self.scene.sync_entities();
        handle
    }

    /// Add `component`, unless a component of its type is already attached
    pub fn add_component_with<T: Component>(&mut self, component: T) -> Option<ComponentHandle<T>> {
        let handle = self.scene.components_mut().add_with(self.entity, || component);
        self.scene.sync_entities();
        handle
    }

    /// Builder form of [`GameObject::add_component_with`]
    #[must_use]
    pub fn with<T: Component>(mut self, component: T) -> Self {
        self.add_component_with(component);
        self
    }

    /// Get a component
    pub fn get_component<T: Component>(&self) -> Option<&T> {
        self.scene.components().get::<T>(self.entity)
    }

    /// Get a component mutably
    pub fn get_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.scene.components_mut().get_mut::<T>(self.entity)
    }

    /// Whether a component of type `T` is attached
    pub fn has_component<T: Component>(&self) -> bool {
        self.scene.components().has::<T>(self.entity)
    }

    /// Remove the component of type `T`
    pub fn remove_component<T: Component>(&mut self) {
        self.scene.components_mut().remove::<T>(self.entity);
        self.scene.sync_entities();
    }

    /// Remove the component behind `handle`
    pub fn remove_component_by_handle<T: Component>(&mut self, handle: ComponentHandle<T>) {
        if self.scene.components().owner(handle.id()) == Some(self.entity) {
            self.scene.components_mut().remove_by_handle(handle);
            self.scene.sync_entities();
        }
    }

    /// Type names of the attached components
    pub fn component_names(&self) -> Vec<&'static str> {
        self.scene.components().component_names(self.entity)
    }

    /// The entity's transform
    pub fn transform(&self) -> Option<TransformRef<'_>> {
        self.scene.components().transform(self.entity)
    }

    /// The entity's transform, mutably
    pub fn transform_mut(&mut self) -> Option<TransformMut<'_>> {
        self.scene.components_mut().transform_mut(self.entity)
    }

    /// Attach under `parent`'s transform, see [`TransformMut::set_parent`]
    pub fn set_parent(&mut self, parent: Option<Entity>, preserve_world: bool) -> bool {
        self.transform_mut()
            .is_some_and(|mut transform| transform.set_parent(parent, preserve_world))
    }

    /// Destroy the entity
    pub fn destroy(self) {
        self.scene.destroy_entity(self.entity);
    }
}
