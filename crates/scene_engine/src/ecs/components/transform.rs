//! Transform component for the ECS system
//!
//! Every entity owns exactly one `Transform`. It stores the pose relative to the
//! parent transform plus a lazily recomputed world pose guarded by a dirty flag.
//! Parent and child links are arena indices into the scene's component storage; the
//! hierarchy never owns the transforms it links.
//!
//! Mutation goes through [`crate::ecs::TransformMut`], which propagates dirtiness to the
//! whole subtree. Reads of the world pose go through [`crate::ecs::TransformRef`].

use crate::ecs::{Component, ComponentId, OrderTag};
use crate::foundation::math::{Pose, Quat, Vec3};
use std::cell::Cell;

/// ECS Transform component
#[derive(Debug)]
pub struct Transform {
    pub(crate) local: Pose,
    world: Cell<Pose>,
    dirty: Cell<bool>,
    pub(crate) parent: Option<ComponentId>,
    pub(crate) children: Vec<ComponentId>,
}

impl Component for Transform {
    fn order_tag(&self) -> OrderTag {
        OrderTag::Transform
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            local: Pose::identity(),
            world: Cell::new(Pose::identity()),
            dirty: Cell::new(true),
            parent: None,
            children: Vec::new(),
        }
    }
}

impl Transform {
    /// Position relative to the parent
    pub fn local_position(&self) -> Vec3 {
        self.local.position
    }

    /// Rotation relative to the parent
    pub fn local_rotation(&self) -> Quat {
        self.local.rotation
    }

    /// Scale relative to the parent
    pub fn local_scale(&self) -> Vec3 {
        self.local.scale
    }

    /// Full pose relative to the parent
    pub fn local_pose(&self) -> Pose {
        self.local
    }

    /// Whether the cached world pose must be recomputed before it is read
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Cached world pose, if it is valid
    pub fn cached_world(&self) -> Option<Pose> {
        (!self.dirty.get()).then(|| self.world.get())
    }

    /// Arena index of the parent transform
    pub fn parent_id(&self) -> Option<ComponentId> {
        self.parent
    }

    /// Arena indices of the child transforms, in attach order
    pub fn children_ids(&self) -> &[ComponentId] {
        &self.children
    }

    pub(crate) fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    pub(crate) fn store_world(&self, world: Pose) {
        self.world.set(world);
        self.dirty.set(false);
    }
}
