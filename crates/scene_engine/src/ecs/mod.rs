//! Entity-Component-System implementation
//!
//! Components live in a per-scene [`ComponentManager`] arena, grouped into
//! [`OrderTag`] buckets that fix the per-frame update order.

pub mod component;
pub mod component_manager;
pub mod components;
pub mod entity;
pub mod hierarchy;
pub mod order_tag;

pub use component::{AsAny, Component, ComponentContext, ComponentFlags, ComponentHandle, ComponentId};
pub use component_manager::ComponentManager;
pub use components::{Camera, Projection, Transform};
pub use entity::Entity;
pub use hierarchy::{TransformMut, TransformRef};
pub use order_tag::OrderTag;
