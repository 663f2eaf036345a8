//! # Component Manager
//!
//! Sole owner of every component in a scene. Components live in a slot-map arena and
//! are indexed three ways:
//!
//! - by `(entity, type)` for O(1) `get`/`has`;
//! - by concrete type, in insertion order, for `get_all`;
//! - by [`OrderTag`] bucket, in insertion order, for the wake and update passes.
//!
//! ## Deferred mutation
//!
//! While a pass (`wake_all`, `update_all`) or any lifecycle hook is running, `add`,
//! `remove` and `despawn` do not touch the indices. They are recorded as
//! pending operations and applied in request order once the outermost pass completes, so
//! every component iterating a bucket sees a stable snapshot for the whole frame.

use super::component::{Component, ComponentContext, ComponentFlags, ComponentHandle, ComponentId};
use super::components::transform::Transform;
use super::hierarchy;
use super::{Entity, OrderTag};
use crate::foundation::time::FrameTime;
use log::{debug, trace, warn};
use slotmap::SlotMap;
use std::any::{type_name, TypeId};
use std::collections::{HashMap, VecDeque};

/// Stored component plus its bookkeeping
struct ComponentSlot {
    entity: Entity,
    type_id: TypeId,
    type_name: &'static str,
    tag: OrderTag,
    flags: ComponentFlags,
    /// `None` while the component is checked out to run one of its hooks
    component: Option<Box<dyn Component>>,
}

/// Per-entity bookkeeping
struct EntityRecord {
    transform: ComponentId,
    /// Committed components in insertion order
    components: Vec<ComponentId>,
}

/// Structural change requested while a pass was running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingOp {
    /// Commit an already constructed component into the indices
    Add(ComponentId),
    /// Remove the component of a type from an entity
    Remove { entity: Entity, type_id: TypeId },
    /// Remove one specific component
    RemoveComponent(ComponentId),
    /// Remove every component of an entity, Transform included
    Despawn(Entity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hook {
    Awake,
    Start,
    Update,
    Detach,
}

/// Owner and lifecycle driver for all components of one scene
pub struct ComponentManager {
    slots: SlotMap<ComponentId, ComponentSlot>,
    entities: HashMap<Entity, EntityRecord>,
    lookup: HashMap<(Entity, TypeId), ComponentId>,
    by_type: HashMap<TypeId, Vec<ComponentId>>,
    buckets: [Vec<ComponentId>; OrderTag::COUNT],

    /// Constructed but not yet committed components, for idempotent deferred adds
    pending_adds: HashMap<(Entity, TypeId), ComponentId>,
    pending_ops: VecDeque<PendingOp>,
    pending_start: Vec<ComponentId>,

    /// Entities created or destroyed from inside hooks, drained by the owning scene
    pub(crate) spawned: Vec<Entity>,
    pub(crate) despawned: Vec<Entity>,

    started: bool,
    pass_depth: u32,
    time: FrameTime,
}

impl ComponentManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            entities: HashMap::new(),
            lookup: HashMap::new(),
            by_type: HashMap::new(),
            buckets: Default::default(),
            pending_adds: HashMap::new(),
            pending_ops: VecDeque::new(),
            pending_start: Vec::new(),
            spawned: Vec::new(),
            despawned: Vec::new(),
            started: false,
            pass_depth: 0,
            time: FrameTime::default(),
        }
    }

    /// Whether `wake_all` has run
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether structural changes are currently being queued instead of applied
    pub fn is_deferring(&self) -> bool {
        self.pass_depth > 0
    }

    /// Number of committed components
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    /// Whether no component is committed
    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Whether `entity` is alive in this manager
    pub fn contains_entity(&self, entity: Entity) -> bool {
        self.entities.contains_key(&entity)
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    /// Create the bookkeeping for `entity` together with its mandatory [`Transform`]
    ///
    /// Idempotent. During a pass the Transform is committed with the other deferred
    /// operations, but the entity is alive (and accepts adds) immediately.
    pub fn spawn(&mut self, entity: Entity) {
        if self.entities.contains_key(&entity) {
            return;
        }

        let transform = self.insert_slot(entity, Transform::default());
        self.entities.insert(entity, EntityRecord {
            transform,
            components: Vec::new(),
        });

        if self.is_deferring() {
            self.pending_adds.insert((entity, TypeId::of::<Transform>()), transform);
            self.pending_ops.push_back(PendingOp::Add(transform));
        } else {
            self.commit_add(transform);
            self.flush_pending();
        }
        trace!("Spawned {}", entity);
    }

    /// Detach and drop every component of `entity`, including its Transform
    ///
    /// Children of the entity's Transform become roots. Deferred during a pass.
    pub fn despawn(&mut self, entity: Entity) {
        if !self.entities.contains_key(&entity) {
            return;
        }

        if self.is_deferring() {
            self.pending_ops.push_back(PendingOp::Despawn(entity));
        } else {
            self.apply_despawn(entity);
            self.flush_pending();
        }
    }

    // ------------------------------------------------------------------
    // Adding and removing
    // ------------------------------------------------------------------

    /// Add a default-constructed `T` to `entity`
    ///
    /// Returns the existing handle if `entity` already has (or is about to receive) a
    /// `T`. Returns `None` only if `entity` is not alive.
    pub fn add<T: Component + Default>(&mut self, entity: Entity) -> Option<ComponentHandle<T>> {
        self.add_with(entity, T::default)
    }

    /// Add a `T` built by `make` to `entity`
    ///
    /// `make` only runs if `entity` has no `T` yet.
    pub fn add_with<T: Component>(&mut self, entity: Entity, make: impl FnOnce() -> T) -> Option<ComponentHandle<T>> {
        if !self.entities.contains_key(&entity) {
            warn!("Cannot add {} to {}: entity is not alive", type_name::<T>(), entity);
            return None;
        }

        let key = (entity, TypeId::of::<T>());
        if let Some(&id) = self.lookup.get(&key).or_else(|| self.pending_adds.get(&key)) {
            trace!("{} already has {}, returning existing instance", entity, type_name::<T>());
            return Some(ComponentHandle::new(id));
        }

        let id = self.insert_slot(entity, make());
        if self.is_deferring() {
            self.pending_adds.insert(key, id);
            self.pending_ops.push_back(PendingOp::Add(id));
        } else {
            self.commit_add(id);
            self.flush_pending();
        }

        Some(ComponentHandle::new(id))
    }

    /// Remove the `T` component of `entity`
    ///
    /// Missing components are ignored. The mandatory [`Transform`] cannot be removed this
    /// way; use [`ComponentManager::despawn`] to tear down the whole entity.
    pub fn remove<T: Component>(&mut self, entity: Entity) {
        let type_id = TypeId::of::<T>();
        if type_id == TypeId::of::<Transform>() {
            warn!("Refusing to remove the mandatory Transform of {}", entity);
            return;
        }

        if self.is_deferring() {
            self.pending_ops.push_back(PendingOp::Remove { entity, type_id });
        } else {
            self.apply_remove_type(entity, type_id);
            self.flush_pending();
        }
    }

    /// Remove the component behind `handle`
    pub fn remove_by_handle<T: Component>(&mut self, handle: ComponentHandle<T>) {
        self.remove_component(handle.id());
    }

    /// Remove a component by its arena index
    pub fn remove_component(&mut self, id: ComponentId) {
        let Some(slot) = self.slots.get(id) else {
            return;
        };
        if slot.type_id == TypeId::of::<Transform>() {
            warn!("Refusing to remove the mandatory Transform of {}", slot.entity);
            return;
        }

        if self.is_deferring() {
            self.pending_ops.push_back(PendingOp::RemoveComponent(id));
        } else {
            self.apply_remove(id);
            self.flush_pending();
        }
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    /// Component id visible to the entity lookups
    ///
    /// Committed components only, except the Transform: it exists from the moment the
    /// entity is spawned, even when its commit is still pending.
    fn visible_id(&self, entity: Entity, type_id: TypeId) -> Option<ComponentId> {
        let key = (entity, type_id);
        self.lookup
            .get(&key)
            .or_else(|| {
                if type_id == TypeId::of::<Transform>() {
                    self.pending_adds.get(&key)
                } else {
                    None
                }
            })
            .copied()
    }

    /// Get the `T` component of `entity`
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        let id = self.visible_id(entity, TypeId::of::<T>())?;
        self.component(ComponentHandle::<T>::new(id))
    }

    /// Get the `T` component of `entity` mutably
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let id = self.visible_id(entity, TypeId::of::<T>())?;
        self.component_mut(ComponentHandle::<T>::new(id))
    }

    /// Whether `entity` has a `T` component
    ///
    /// Components are visible once committed. The Transform of an entity spawned
    /// during a pass is visible right away.
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.visible_id(entity, TypeId::of::<T>()).is_some()
    }

    /// Handle of the `T` component of `entity`
    pub fn handle<T: Component>(&self, entity: Entity) -> Option<ComponentHandle<T>> {
        self.visible_id(entity, TypeId::of::<T>()).map(ComponentHandle::new)
    }

    /// Resolve a handle
    ///
    /// Unlike the entity lookups this also reaches components whose add is still
    /// pending, so a freshly added component can be configured right away.
    pub fn component<T: Component>(&self, handle: ComponentHandle<T>) -> Option<&T> {
        self.slots
            .get(handle.id())?
            .component
            .as_deref()?
            .as_any()
            .downcast_ref::<T>()
    }

    /// Resolve a handle mutably
    pub fn component_mut<T: Component>(&mut self, handle: ComponentHandle<T>) -> Option<&mut T> {
        self.slots
            .get_mut(handle.id())?
            .component
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// All committed components of `entity`, in insertion order
    pub fn get_all_for(&self, entity: Entity) -> impl Iterator<Item = &dyn Component> + '_ {
        self.entities
            .get(&entity)
            .into_iter()
            .flat_map(|record| record.components.iter())
            .filter_map(move |id| self.slots.get(*id)?.component.as_deref())
    }

    /// Type names of the committed components of `entity`, in insertion order
    pub fn component_names(&self, entity: Entity) -> Vec<&'static str> {
        self.entities
            .get(&entity)
            .map(|record| {
                record.components
                    .iter()
                    .filter_map(|id| self.slots.get(*id).map(|slot| slot.type_name))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All committed `T` components of the scene, in insertion order
    pub fn get_all<T: Component>(&self) -> impl Iterator<Item = &T> + '_ {
        self.iter::<T>().map(|(_, component)| component)
    }

    /// All committed `T` components with their entities, in insertion order
    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.by_type
            .get(&TypeId::of::<T>())
            .into_iter()
            .flatten()
            .filter_map(move |id| {
                let slot = self.slots.get(*id)?;
                let component = slot.component.as_deref()?.as_any().downcast_ref::<T>()?;
                Some((slot.entity, component))
            })
    }

    /// Handles of all committed `T` components, in insertion order
    pub fn handles<T: Component>(&self) -> Vec<ComponentHandle<T>> {
        self.by_type
            .get(&TypeId::of::<T>())
            .map(|ids| ids.iter().map(|&id| ComponentHandle::new(id)).collect())
            .unwrap_or_default()
    }

    /// Entity owning a component
    pub fn owner(&self, id: ComponentId) -> Option<Entity> {
        self.slots.get(id).map(|slot| slot.entity)
    }

    /// Lifecycle flags of a component
    pub fn flags(&self, id: ComponentId) -> Option<ComponentFlags> {
        self.slots.get(id).map(|slot| slot.flags)
    }

    /// Lifecycle flags of the component behind `handle`
    pub fn component_state<T: Component>(&self, handle: ComponentHandle<T>) -> Option<ComponentFlags> {
        self.flags(handle.id())
    }

    /// Ordering tag of a component
    pub fn order_tag(&self, id: ComponentId) -> Option<OrderTag> {
        self.slots.get(id).map(|slot| slot.tag)
    }

    /// Committed components of a tag bucket, in update order
    pub fn bucket(&self, tag: OrderTag) -> &[ComponentId] {
        &self.buckets[tag.index()]
    }

    /// Arena index of the Transform of `entity`, committed or not
    pub(crate) fn transform_id(&self, entity: Entity) -> Option<ComponentId> {
        self.entities.get(&entity).map(|record| record.transform)
    }

    // ------------------------------------------------------------------
    // Activation
    // ------------------------------------------------------------------

    /// Whether a component is active
    pub fn is_active(&self, id: ComponentId) -> bool {
        self.slots
            .get(id)
            .map_or(false, |slot| slot.flags.contains(ComponentFlags::ACTIVE))
    }

    /// Enable or disable a component
    ///
    /// Activating a component that never started queues its Start for the next frame.
    pub fn set_active(&mut self, id: ComponentId, active: bool) {
        let Some(slot) = self.slots.get_mut(id) else {
            return;
        };
        slot.flags.set(ComponentFlags::ACTIVE, active);

        let ready = slot.flags.contains(ComponentFlags::COMMITTED) && !slot.flags.contains(ComponentFlags::STARTED);
        if active && ready {
            self.queue_start(id);
        }
    }

    // ------------------------------------------------------------------
    // Passes
    // ------------------------------------------------------------------

    /// Run Awake once for every component that has not awakened, in tag order
    ///
    /// Marks the manager as started: components added afterwards awaken on add.
    pub fn wake_all(&mut self) {
        if self.started {
            debug!("wake_all called on an already started component manager");
            return;
        }
        self.started = true;

        self.pass_depth += 1;
        for tag in OrderTag::ALL {
            let mut index = 0;
            while let Some(&id) = self.buckets[tag.index()].get(index) {
                index += 1;
                let awakened = self.slots.get(id).map_or(true, |slot| slot.flags.contains(ComponentFlags::AWAKENED));
                if !awakened {
                    self.run_hook(id, Hook::Awake);
                }
            }
        }
        self.pass_depth -= 1;

        self.flush_pending();
    }

    /// Run one frame: pending Start calls, then Update in tag order, then apply
    /// every structural change requested during the frame
    pub fn update_all(&mut self, time: FrameTime) {
        self.time = time;
        self.pass_depth += 1;

        self.run_pending_starts();

        for tag in OrderTag::ALL {
            let mut index = 0;
            while let Some(&id) = self.buckets[tag.index()].get(index) {
                index += 1;
                let Some(flags) = self.slots.get(id).map(|slot| slot.flags) else {
                    continue;
                };
                if !flags.contains(ComponentFlags::ACTIVE) {
                    continue;
                }
                if flags.contains(ComponentFlags::STARTED) {
                    self.run_hook(id, Hook::Update);
                } else {
                    self.queue_start(id);
                }
            }
        }

        self.pass_depth -= 1;
        self.flush_pending();
    }

    fn run_pending_starts(&mut self) {
        let queued = std::mem::take(&mut self.pending_start);
        for id in queued {
            let Some(slot) = self.slots.get_mut(id) else {
                continue;
            };
            slot.flags.remove(ComponentFlags::START_QUEUED);

            let flags = slot.flags;
            if !flags.contains(ComponentFlags::ACTIVE) || flags.contains(ComponentFlags::STARTED) {
                continue;
            }
            if !flags.contains(ComponentFlags::AWAKENED) {
                // Start must never precede Awake; wait for wake_all
                self.queue_start(id);
                continue;
            }
            self.run_hook(id, Hook::Start);
        }
    }

    fn queue_start(&mut self, id: ComponentId) {
        if let Some(slot) = self.slots.get_mut(id) {
            if !slot.flags.contains(ComponentFlags::START_QUEUED) {
                slot.flags.insert(ComponentFlags::START_QUEUED);
                self.pending_start.push(id);
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn insert_slot<T: Component>(&mut self, entity: Entity, component: T) -> ComponentId {
        let tag = component.order_tag();
        self.slots.insert(ComponentSlot {
            entity,
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            tag,
            flags: ComponentFlags::ACTIVE,
            component: Some(Box::new(component)),
        })
    }

    /// Make a constructed component visible and run the add-time lifecycle
    fn commit_add(&mut self, id: ComponentId) {
        let Some(slot) = self.slots.get_mut(id) else {
            return;
        };
        let (entity, type_id, tag) = (slot.entity, slot.type_id, slot.tag);
        self.pending_adds.remove(&(entity, type_id));

        let Some(record) = self.entities.get_mut(&entity) else {
            debug!("Dropping {} added to {} after it was destroyed", slot.type_name, entity);
            self.slots.remove(id);
            return;
        };

        slot.flags.insert(ComponentFlags::COMMITTED);
        record.components.push(id);
        self.lookup.insert((entity, type_id), id);
        self.by_type.entry(type_id).or_default().push(id);
        self.buckets[tag.index()].push(id);

        if self.started {
            self.run_hook(id, Hook::Awake);
        }
        if self.is_active(id) {
            self.queue_start(id);
        }
    }

    fn apply_remove_type(&mut self, entity: Entity, type_id: TypeId) {
        let key = (entity, type_id);
        if let Some(&id) = self.lookup.get(&key).or_else(|| self.pending_adds.get(&key)) {
            self.apply_remove(id);
        }
    }

    /// Detach and drop a component; the Transform guard lives in the public entry points
    fn apply_remove(&mut self, id: ComponentId) {
        let Some(slot) = self.slots.get(id) else {
            return;
        };
        let (entity, type_id, tag) = (slot.entity, slot.type_id, slot.tag);

        if !slot.flags.contains(ComponentFlags::COMMITTED) {
            // Never became visible: cancel the pending add, no lifecycle to unwind
            self.pending_adds.remove(&(entity, type_id));
            self.slots.remove(id);
            return;
        }

        if type_id == TypeId::of::<Transform>() {
            hierarchy::detach(self, id);
        }
        // Unindexed before the hook so an add of the same type from on_detach builds a
        // fresh component instead of returning this one
        self.lookup.remove(&(entity, type_id));
        self.run_hook(id, Hook::Detach);

        if let Some(record) = self.entities.get_mut(&entity) {
            record.components.retain(|&other| other != id);
        }
        if let Some(ids) = self.by_type.get_mut(&type_id) {
            ids.retain(|&other| other != id);
        }
        self.buckets[tag.index()].retain(|&other| other != id);
        self.pending_start.retain(|&other| other != id);

        if let Some(slot) = self.slots.remove(id) {
            trace!("Removed {} from {}", slot.type_name, entity);
        }
    }

    fn apply_despawn(&mut self, entity: Entity) {
        let Some(record) = self.entities.get(&entity) else {
            return;
        };
        let transform = record.transform;
        let components: Vec<ComponentId> = record.components
            .iter()
            .copied()
            .filter(|&id| id != transform)
            .collect();

        // Everything else detaches while the Transform is still readable
        for id in components {
            self.apply_remove(id);
        }

        let pending: Vec<ComponentId> = self.pending_adds
            .iter()
            .filter(|((owner, _), _)| *owner == entity)
            .map(|(_, &id)| id)
            .collect();
        for id in pending {
            self.apply_remove(id);
        }

        self.apply_remove(transform);
        self.entities.remove(&entity);
        debug!("Despawned {}", entity);
    }

    fn apply(&mut self, op: PendingOp) {
        match op {
            PendingOp::Add(id) => self.commit_add(id),
            PendingOp::Remove { entity, type_id } => self.apply_remove_type(entity, type_id),
            PendingOp::RemoveComponent(id) => self.apply_remove(id),
            PendingOp::Despawn(entity) => self.apply_despawn(entity),
        }
    }

    /// Apply queued operations in request order, including any queued while applying
    fn flush_pending(&mut self) {
        if self.is_deferring() {
            return;
        }
        while let Some(op) = self.pending_ops.pop_front() {
            trace!("Applying deferred {:?}", op);
            self.apply(op);
        }
    }

    /// Check a component out of its slot and run one of its hooks
    fn run_hook(&mut self, id: ComponentId, hook: Hook) {
        let Some(slot) = self.slots.get_mut(id) else {
            return;
        };
        let Some(mut component) = slot.component.take() else {
            // Already running further up the stack
            return;
        };
        match hook {
            Hook::Awake => slot.flags.insert(ComponentFlags::AWAKENED),
            Hook::Start => slot.flags.insert(ComponentFlags::STARTED),
            Hook::Update | Hook::Detach => {}
        }
        let entity = slot.entity;
        let time = self.time;

        self.pass_depth += 1;
        {
            let mut ctx = ComponentContext {
                manager: self,
                entity,
                id,
                time,
            };
            match hook {
                Hook::Awake => component.awake(&mut ctx),
                Hook::Start => component.start(&mut ctx),
                Hook::Update => component.update(&mut ctx),
                Hook::Detach => component.on_detach(&mut ctx),
            }
        }
        self.pass_depth -= 1;

        if let Some(slot) = self.slots.get_mut(id) {
            slot.component = Some(component);
        }
    }
}

impl Default for ComponentManager {
    fn default() -> Self {
        Self::new()
    }
}
