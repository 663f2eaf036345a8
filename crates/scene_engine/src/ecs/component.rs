//! Component trait, handles and the context passed to lifecycle hooks

use super::hierarchy::{TransformMut, TransformRef};
use super::{ComponentManager, Entity, OrderTag};
use crate::foundation::time::FrameTime;
use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

slotmap::new_key_type! {
    /// Stable arena index of a component inside its scene's [`ComponentManager`]
    pub struct ComponentId;
}

/// Type-erasure helper implemented for every sized `'static` type
pub trait AsAny {
    /// Borrow as `&dyn Any` for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Borrow as `&mut dyn Any` for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A unit of behavior or data bound to exactly one entity
///
/// Lifecycle guarantees, enforced by [`ComponentManager`]:
/// - `awake` runs at most once, when the scene starts (or on add, if it already has);
/// - `start` runs at most once, never before `awake`, at the beginning of the first
///   `update_all` after the component became active;
/// - `update` runs once per frame for active, started components, in [`OrderTag`] order;
/// - `on_detach` runs when the component is removed, before it leaves the indices.
///
/// While a hook runs the component is checked out of storage, so looking itself up
/// through the context returns `None`.
pub trait Component: AsAny + 'static {
    /// Tag deciding where this component runs in the frame
    ///
    /// Read once when the component is added; must depend only on the concrete type.
    fn order_tag(&self) -> OrderTag {
        OrderTag::Behavior
    }

    /// Called once when the owning scene starts
    fn awake(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Called once before the first update
    fn start(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Called every frame while active
    fn update(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Called when the component is removed from its entity
    fn on_detach(&mut self, _ctx: &mut ComponentContext<'_>) {}
}

/// Typed handle to a component stored in a [`ComponentManager`]
pub struct ComponentHandle<T> {
    id: ComponentId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ComponentHandle<T> {
    pub(crate) fn new(id: ComponentId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// Untyped arena index
    pub fn id(&self) -> ComponentId {
        self.id
    }
}

impl<T> Clone for ComponentHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ComponentHandle<T> {}

impl<T> PartialEq for ComponentHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for ComponentHandle<T> {}

impl<T> Hash for ComponentHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for ComponentHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("type", &std::any::type_name::<T>())
            .field("id", &self.id)
            .finish()
    }
}

bitflags::bitflags! {
    /// Lifecycle state of a stored component
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ComponentFlags: u8 {
        /// Receives start/update
        const ACTIVE = 1;
        /// `awake` has run
        const AWAKENED = 1 << 1;
        /// `start` has run
        const STARTED = 1 << 2;
        /// Waiting in the pending-start queue
        const START_QUEUED = 1 << 3;
        /// Visible to lookups and bucket iteration
        const COMMITTED = 1 << 4;
    }
}

/// Access to the scene's components from inside a lifecycle hook
///
/// Structural changes requested here (add, remove, spawn, destroy) are queued and
/// applied once the running pass completes.
pub struct ComponentContext<'a> {
    pub(crate) manager: &'a mut ComponentManager,
    pub(crate) entity: Entity,
    pub(crate) id: ComponentId,
    pub(crate) time: FrameTime,
}

impl<'a> ComponentContext<'a> {
    /// Entity the running component belongs to
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Arena index of the running component
    pub fn component_id(&self) -> ComponentId {
        self.id
    }

    /// Timing of the current frame
    pub fn time(&self) -> FrameTime {
        self.time
    }

    /// Full access to the scene's component manager
    pub fn manager(&mut self) -> &mut ComponentManager {
        self.manager
    }

    /// Add a component to this entity (deferred until the pass completes)
    pub fn add<T: Component + Default>(&mut self) -> Option<ComponentHandle<T>> {
        self.manager.add::<T>(self.entity)
    }

    /// Add a component built by `make` to this entity (deferred until the pass completes)
    pub fn add_with<T: Component>(&mut self, make: impl FnOnce() -> T) -> Option<ComponentHandle<T>> {
        self.manager.add_with(self.entity, make)
    }

    /// Get a sibling component
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.manager.get::<T>(self.entity)
    }

    /// Get a sibling component mutably
    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.manager.get_mut::<T>(self.entity)
    }

    /// Whether this entity has a component of type `T`
    pub fn has<T: Component>(&self) -> bool {
        self.manager.has::<T>(self.entity)
    }

    /// Remove a component of type `T` from this entity (deferred)
    pub fn remove<T: Component>(&mut self) {
        self.manager.remove::<T>(self.entity);
    }

    /// Remove the running component itself (deferred)
    pub fn remove_self(&mut self) {
        self.manager.remove_component(self.id);
    }

    /// Enable or disable the running component
    pub fn set_active(&mut self, active: bool) {
        self.manager.set_active(self.id, active);
    }

    /// This entity's transform
    pub fn transform(&self) -> Option<TransformRef<'_>> {
        self.manager.transform(self.entity)
    }

    /// This entity's transform, mutably
    pub fn transform_mut(&mut self) -> Option<TransformMut<'_>> {
        self.manager.transform_mut(self.entity)
    }

    /// Create a new entity in the same scene; it joins the scene's entity list after the pass
    pub fn spawn_entity(&mut self) -> Entity {
        let entity = Entity::new(self.entity.scene());
        self.manager.spawn(entity);
        self.manager.spawned.push(entity);
        entity
    }

    /// Destroy an entity of this scene; it leaves the scene's entity list after the pass
    pub fn destroy_entity(&mut self, entity: Entity) {
        if self.manager.contains_entity(entity) {
            self.manager.despawn(entity);
            self.manager.despawned.push(entity);
        }
    }
}
