//! Transform hierarchy
//!
//! Parent/child links between [`Transform`] components are arena indices, so every
//! hierarchy operation needs the owning [`ComponentManager`]. [`TransformRef`] and
//! [`TransformMut`] bundle the manager with one transform and expose the scene graph
//! API: local setters that invalidate the subtree, lazily resolved world reads,
//! re-parenting and navigation.
//!
//! World poses compose parent first: scale component-wise, then rotation, then
//! translation (see [`Pose::combine`]). A root's world pose equals its local pose.

use super::component::{ComponentHandle, ComponentId};
use super::components::transform::Transform;
use super::{ComponentManager, Entity};
use crate::foundation::math::{Mat4, Pose, Quat, Vec3};
use log::{trace, warn};

fn node(manager: &ComponentManager, id: ComponentId) -> Option<&Transform> {
    manager.component(ComponentHandle::<Transform>::new(id))
}

fn node_mut(manager: &mut ComponentManager, id: ComponentId) -> Option<&mut Transform> {
    manager.component_mut(ComponentHandle::<Transform>::new(id))
}

/// Mark a transform and every descendant dirty
pub(crate) fn mark_dirty(manager: &ComponentManager, id: ComponentId) {
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
        if let Some(transform) = node(manager, current) {
            transform.mark_dirty();
            stack.extend(transform.children.iter().copied());
        }
    }
}

/// Resolve the world pose of a transform, refreshing every dirty ancestor on the way
pub(crate) fn resolve_world(manager: &ComponentManager, id: ComponentId) -> Pose {
    // Walk up until a clean ancestor (or the root), then compose back down
    let mut chain = Vec::new();
    let mut parent_world = None;
    let mut cursor = Some(id);
    while let Some(current) = cursor {
        let Some(transform) = node(manager, current) else {
            break;
        };
        if let Some(world) = transform.cached_world() {
            parent_world = Some(world);
            break;
        }
        chain.push(current);
        cursor = transform.parent;
    }

    for &current in chain.iter().rev() {
        let Some(transform) = node(manager, current) else {
            continue;
        };
        let world = match parent_world {
            Some(parent) => parent.combine(&transform.local),
            None => transform.local,
        };
        transform.store_world(world);
        parent_world = Some(world);
    }

    parent_world.unwrap_or_default()
}

fn is_ancestor(manager: &ComponentManager, ancestor: ComponentId, id: ComponentId) -> bool {
    let mut cursor = node(manager, id).and_then(|t| t.parent);
    while let Some(current) = cursor {
        if current == ancestor {
            return true;
        }
        cursor = node(manager, current).and_then(|t| t.parent);
    }
    false
}

/// Relink `child` under `new_parent`; returns whether the hierarchy changed
pub(crate) fn set_parent(
    manager: &mut ComponentManager,
    child: ComponentId,
    new_parent: Option<ComponentId>,
    preserve_world: bool,
) -> bool {
    let Some(old_parent) = node(manager, child).map(|t| t.parent) else {
        return false;
    };
    if old_parent == new_parent {
        return false;
    }
    if let Some(parent) = new_parent {
        if node(manager, parent).is_none() {
            warn!("Cannot parent transform {:?} to missing transform {:?}", child, parent);
            return false;
        }
        if parent == child || is_ancestor(manager, child, parent) {
            warn!("Rejected re-parent of {:?} under {:?}: would create a cycle", child, parent);
            return false;
        }
    }

    let world = resolve_world(manager, child);
    let parent_world = new_parent.map(|parent| resolve_world(manager, parent));

    if let Some(old) = old_parent.and_then(|old| node_mut(manager, old)) {
        old.children.retain(|&c| c != child);
    }
    if let Some(parent) = new_parent.and_then(|parent| node_mut(manager, parent)) {
        parent.children.push(child);
    }
    if let Some(transform) = node_mut(manager, child) {
        transform.parent = new_parent;
        if preserve_world {
            transform.local = match parent_world {
                Some(parent_world) => world.relative_to(&parent_world),
                None => world,
            };
        }
    }

    mark_dirty(manager, child);
    trace!("Transform {:?} parent {:?} -> {:?}", child, old_parent, new_parent);
    true
}

/// Unlink a transform from the hierarchy: children become roots keeping their world
/// pose, then the transform itself leaves its parent
pub(crate) fn detach(manager: &mut ComponentManager, id: ComponentId) {
    let children = node(manager, id).map(|t| t.children.clone()).unwrap_or_default();
    for child in children {
        set_parent(manager, child, None, true);
    }
    set_parent(manager, id, None, false);
}

impl ComponentManager {
    /// Read access to an entity's transform
    pub fn transform(&self, entity: Entity) -> Option<TransformRef<'_>> {
        let id = self.transform_id(entity)?;
        node(self, id)?;
        Some(TransformRef { manager: self, id })
    }

    /// Write access to an entity's transform
    pub fn transform_mut(&mut self, entity: Entity) -> Option<TransformMut<'_>> {
        let id = self.transform_id(entity)?;
        node(self, id)?;
        Some(TransformMut { manager: self, id })
    }
}

/// Read view of one transform in the hierarchy
#[derive(Clone, Copy)]
pub struct TransformRef<'a> {
    manager: &'a ComponentManager,
    id: ComponentId,
}

impl<'a> TransformRef<'a> {
    fn node(&self) -> Option<&'a Transform> {
        node(self.manager, self.id)
    }

    /// Arena index of this transform
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Entity owning this transform
    pub fn entity(&self) -> Option<Entity> {
        self.manager.owner(self.id)
    }

    /// Local pose
    pub fn local_pose(&self) -> Pose {
        self.node().map(Transform::local_pose).unwrap_or_default()
    }

    /// Local position
    pub fn local_position(&self) -> Vec3 {
        self.local_pose().position
    }

    /// Local rotation
    pub fn local_rotation(&self) -> Quat {
        self.local_pose().rotation
    }

    /// Local scale
    pub fn local_scale(&self) -> Vec3 {
        self.local_pose().scale
    }

    /// Whether the cached world pose is stale
    pub fn is_dirty(&self) -> bool {
        self.node().map_or(true, Transform::is_dirty)
    }

    /// World pose, recomputed if dirty
    pub fn world_pose(&self) -> Pose {
        resolve_world(self.manager, self.id)
    }

    /// World position
    pub fn world_position(&self) -> Vec3 {
        self.world_pose().position
    }

    /// World rotation
    pub fn world_rotation(&self) -> Quat {
        self.world_pose().rotation
    }

    /// World scale
    pub fn world_scale(&self) -> Vec3 {
        self.world_pose().scale
    }

    /// World transformation matrix
    pub fn world_matrix(&self) -> Mat4 {
        self.world_pose().to_matrix()
    }

    /// Entity owning the parent transform
    pub fn parent(&self) -> Option<Entity> {
        let parent = self.node()?.parent?;
        self.manager.owner(parent)
    }

    /// Entities owning the child transforms, in attach order
    pub fn children(&self) -> Vec<Entity> {
        self.node()
            .map(|t| t.children.iter().filter_map(|&c| self.manager.owner(c)).collect())
            .unwrap_or_default()
    }

    /// Number of direct children
    pub fn child_count(&self) -> usize {
        self.node().map_or(0, |t| t.children.len())
    }

    /// Entity at the top of this transform's hierarchy (itself for a root)
    pub fn root(&self) -> Option<Entity> {
        let mut current = self.id;
        while let Some(parent) = node(self.manager, current).and_then(|t| t.parent) {
            current = parent;
        }
        self.manager.owner(current)
    }

    /// Whether `ancestor`'s transform is above this one in the hierarchy
    pub fn is_descendant_of(&self, ancestor: Entity) -> bool {
        self.manager
            .transform_id(ancestor)
            .is_some_and(|ancestor| is_ancestor(self.manager, ancestor, self.id))
    }
}

/// Write view of one transform in the hierarchy
pub struct TransformMut<'a> {
    manager: &'a mut ComponentManager,
    id: ComponentId,
}

impl<'a> TransformMut<'a> {
    /// Reborrow as a read view
    pub fn read(&self) -> TransformRef<'_> {
        TransformRef {
            manager: &*self.manager,
            id: self.id,
        }
    }

    fn modify_local(&mut self, edit: impl FnOnce(&mut Pose)) {
        if let Some(transform) = node_mut(self.manager, self.id) {
            edit(&mut transform.local);
        }
        mark_dirty(self.manager, self.id);
    }

    fn parent_world(&self) -> Option<Pose> {
        let manager = &*self.manager;
        let parent = node(manager, self.id)?.parent?;
        Some(resolve_world(manager, parent))
    }

    /// Entity owning this transform
    pub fn entity(&self) -> Option<Entity> {
        self.read().entity()
    }

    /// Local pose
    pub fn local_pose(&self) -> Pose {
        self.read().local_pose()
    }

    /// Local position
    pub fn local_position(&self) -> Vec3 {
        self.read().local_position()
    }

    /// World pose, recomputed if dirty
    pub fn world_pose(&self) -> Pose {
        self.read().world_pose()
    }

    /// World position
    pub fn world_position(&self) -> Vec3 {
        self.read().world_position()
    }

    /// World rotation
    pub fn world_rotation(&self) -> Quat {
        self.read().world_rotation()
    }

    /// World scale
    pub fn world_scale(&self) -> Vec3 {
        self.read().world_scale()
    }

    /// Set the local position
    pub fn set_local_position(&mut self, position: Vec3) {
        self.modify_local(|local| local.position = position);
    }

    /// Set the local rotation
    pub fn set_local_rotation(&mut self, rotation: Quat) {
        self.modify_local(|local| local.rotation = rotation);
    }

    /// Set the local scale
    pub fn set_local_scale(&mut self, scale: Vec3) {
        self.modify_local(|local| local.scale = scale);
    }

    /// Set the whole local pose
    pub fn set_local_pose(&mut self, pose: Pose) {
        self.modify_local(|local| *local = pose);
    }

    /// Move by `delta` in parent space
    pub fn translate(&mut self, delta: Vec3) {
        self.modify_local(|local| local.position += delta);
    }

    /// Apply `rotation` on top of the current local rotation
    pub fn rotate(&mut self, rotation: Quat) {
        self.modify_local(|local| local.rotation = rotation * local.rotation);
    }

    /// Place the transform so its world pose equals `world`
    pub fn set_world_pose(&mut self, world: Pose) {
        let local = match self.parent_world() {
            Some(parent_world) => world.relative_to(&parent_world),
            None => world,
        };
        self.set_local_pose(local);
    }

    /// Move the transform so its world position equals `position`
    pub fn set_world_position(&mut self, position: Vec3) {
        let mut world = self.world_pose();
        world.position = position;
        self.set_world_pose(world);
    }

    /// Rotate the transform so its world rotation equals `rotation`
    pub fn set_world_rotation(&mut self, rotation: Quat) {
        let mut world = self.world_pose();
        world.rotation = rotation;
        self.set_world_pose(world);
    }

    /// Attach under `parent` (or make a root with `None`)
    ///
    /// With `preserve_world` the local pose is recomputed so the world pose is unchanged;
    /// otherwise only the links change and the world pose jumps. Returns `false` when
    /// nothing changed: same parent, unknown parent entity, or a cycle.
    pub fn set_parent(&mut self, parent: Option<Entity>, preserve_world: bool) -> bool {
        let parent_id = match parent {
            Some(entity) => match self.manager.transform_id(entity) {
                Some(id) => Some(id),
                None => {
                    warn!("Cannot parent to {}: no transform in this scene", entity);
                    return false;
                }
            },
            None => None,
        };
        set_parent(self.manager, self.id, parent_id, preserve_world)
    }

    /// Leave the parent and turn every child into a root that keeps its world pose
    pub fn detach(&mut self) {
        detach(self.manager, self.id);
    }
}
