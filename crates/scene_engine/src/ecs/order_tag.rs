//! Update and render ordering tags

use std::fmt;

/// Total order used to sequence per-frame component updates and render passes
///
/// Declaration order is the execution order: every `Transform` component updates
/// before any `Physics` component, and so on down to `Render`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OrderTag {
    /// Spatial hierarchy nodes
    Transform,
    /// Physics integration
    Physics,
    /// Collision detection and response
    Collision,
    /// Game logic
    Behavior,
    /// Cameras, updated after everything they may follow
    Camera,
    /// Renderable data, updated last
    Render,
}

impl OrderTag {
    /// Number of tags
    pub const COUNT: usize = 6;

    /// All tags in execution order
    pub const ALL: [OrderTag; Self::COUNT] = [
        OrderTag::Transform,
        OrderTag::Physics,
        OrderTag::Collision,
        OrderTag::Behavior,
        OrderTag::Camera,
        OrderTag::Render,
    ];

    /// Position of this tag in execution order
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human readable tag name
    pub const fn name(self) -> &'static str {
        match self {
            OrderTag::Transform => "Transform",
            OrderTag::Physics => "Physics",
            OrderTag::Collision => "Collision",
            OrderTag::Behavior => "Behavior",
            OrderTag::Camera => "Camera",
            OrderTag::Render => "Render",
        }
    }
}

impl fmt::Display for OrderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
