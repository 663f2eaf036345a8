//! Render passes ordered by tag

use crate::ecs::OrderTag;
use crate::foundation::time::FrameTime;
use crate::scene::Scene;
use log::{debug, trace};

/// One stage of drawing a scene
pub trait RenderPass {
    /// Tag deciding where the pass runs; lower tags draw first
    fn tag(&self) -> OrderTag;

    /// Name used for lookups and logging
    fn name(&self) -> &str;

    /// Draw the scene
    ///
    /// Only committed components are visible through the scene's component queries.
    fn draw(&mut self, scene: &Scene, time: &FrameTime);
}

/// Ordered list of render passes
///
/// Passes are kept sorted by [`OrderTag`]; passes sharing a tag keep their
/// registration order.
#[derive(Default)]
pub struct RenderPassController {
    passes: Vec<Box<dyn RenderPass>>,
}

impl RenderPassController {
    /// Create an empty controller
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pass after every pass with the same or an earlier tag
    pub fn add_pass(&mut self, pass: Box<dyn RenderPass>) {
        let tag = pass.tag();
        let index = self.passes.partition_point(|existing| existing.tag() <= tag);
        debug!("Registered render pass '{}' ({})", pass.name(), tag);
        self.passes.insert(index, pass);
    }

    /// Remove the first pass called `name`
    pub fn remove_pass(&mut self, name: &str) -> Option<Box<dyn RenderPass>> {
        let index = self.passes.iter().position(|pass| pass.name() == name)?;
        Some(self.passes.remove(index))
    }

    /// Pass names in draw order
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Number of passes
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Whether no pass is registered
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Run every pass over `scene` in order
    pub fn draw_all(&mut self, scene: &Scene, time: &FrameTime) {
        for pass in &mut self.passes {
            trace!("Render pass '{}'", pass.name());
            pass.draw(scene, time);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneId;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        tag: OrderTag,
        name: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl RenderPass for Recorder {
        fn tag(&self) -> OrderTag {
            self.tag
        }

        fn name(&self) -> &str {
            self.name
        }

        fn draw(&mut self, _scene: &Scene, _time: &FrameTime) {
            self.log.borrow_mut().push(self.name);
        }
    }

    #[test]
    fn test_passes_draw_in_stable_tag_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut controller = RenderPassController::new();
        for (tag, name) in [
            (OrderTag::Render, "opaque"),
            (OrderTag::Transform, "bounds"),
            (OrderTag::Render, "transparent"),
            (OrderTag::Camera, "shadows"),
        ] {
            controller.add_pass(Box::new(Recorder { tag, name, log: Rc::clone(&log) }));
        }

        let scene = Scene::new(SceneId::default(), "test");
        controller.draw_all(&scene, &FrameTime::default());

        assert_eq!(*log.borrow(), vec!["bounds", "shadows", "opaque", "transparent"]);
        assert_eq!(controller.pass_names(), vec!["bounds", "shadows", "opaque", "transparent"]);
    }

    #[test]
    fn test_remove_pass() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut controller = RenderPassController::new();
        controller.add_pass(Box::new(Recorder { tag: OrderTag::Render, name: "main", log }));

        assert!(controller.remove_pass("missing").is_none());
        assert!(controller.remove_pass("main").is_some());
        assert!(controller.is_empty());
    }
}
