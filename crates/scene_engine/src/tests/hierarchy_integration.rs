//! Transform hierarchy through scenes and components

use crate::ecs::{Component, ComponentContext, Entity};
use crate::foundation::math::{utils, Vec3};
use crate::foundation::time::FrameTime;
use crate::scene::{Scene, SceneManager};

/// Moves its entity along +X by `speed` per second
struct Drift {
    speed: f32,
}

impl Component for Drift {
    fn update(&mut self, ctx: &mut ComponentContext<'_>) {
        let step = self.speed * ctx.time().delta;
        if let Some(mut transform) = ctx.transform_mut() {
            transform.translate(Vec3::new(step, 0.0, 0.0));
        }
    }
}

/// Re-parents its entity under `target` on start, keeping the world pose
struct Adopt {
    target: Entity,
}

impl Component for Adopt {
    fn start(&mut self, ctx: &mut ComponentContext<'_>) {
        let target = self.target;
        if let Some(mut transform) = ctx.transform_mut() {
            transform.set_parent(Some(target), true);
        }
    }
}

fn spawn_at(scene: &mut Scene, position: Vec3) -> Entity {
    let mut object = scene.create_game_object();
    if let Some(mut transform) = object.transform_mut() {
        transform.set_local_position(position);
    }
    object.entity()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TOLERANCE: f32 = 1e-4;

    fn active_scene() -> SceneManager {
        let mut manager = SceneManager::new();
        let id = manager.create_scene(None).unwrap();
        manager.set_active_scene(id).unwrap();
        manager
    }

    #[test]
    fn test_child_world_follows_parent_move() {
        let mut manager = active_scene();
        let scene = manager.get_active_scene_mut().unwrap();
        let a = spawn_at(scene, Vec3::zeros());
        let b = spawn_at(scene, Vec3::new(10.0, 0.0, 0.0));
        assert!(scene.entity(b).unwrap().set_parent(Some(a), false));

        scene.entity(a).unwrap().transform_mut().unwrap().set_local_position(Vec3::new(5.0, 5.0, 0.0));

        let b_world = scene.components().transform(b).unwrap().world_position();
        assert_relative_eq!(b_world, Vec3::new(15.0, 5.0, 0.0));
    }

    #[test]
    fn test_reparent_round_trip_through_nested_scaled_parents() {
        let mut manager = active_scene();
        let scene = manager.get_active_scene_mut().unwrap();
        let outer = spawn_at(scene, Vec3::new(2.0, 0.0, -1.0));
        let middle = spawn_at(scene, Vec3::new(0.0, 3.0, 0.0));
        let inner = spawn_at(scene, Vec3::new(1.0, 1.0, 1.0));
        let mover = spawn_at(scene, Vec3::new(-4.0, 2.5, 8.0));

        {
            let mut object = scene.entity(outer).unwrap();
            let mut transform = object.transform_mut().unwrap();
            transform.set_local_scale(Vec3::new(3.0, 1.0, 0.5));
            transform.set_local_rotation(utils::axis_angle(Vec3::new(1.0, 0.0, 1.0), 0.4));
        }
        {
            let mut object = scene.entity(middle).unwrap();
            object.set_parent(Some(outer), false);
            let mut transform = object.transform_mut().unwrap();
            transform.set_local_scale(Vec3::new(0.5, 2.0, 1.0));
            transform.set_local_rotation(utils::axis_angle(Vec3::y(), 1.1));
        }
        {
            let mut object = scene.entity(inner).unwrap();
            object.set_parent(Some(middle), false);
            object.transform_mut().unwrap().set_local_scale(Vec3::new(1.5, 1.0, 4.0));
        }
        {
            let mut object = scene.entity(mover).unwrap();
            let mut transform = object.transform_mut().unwrap();
            transform.set_local_rotation(utils::axis_angle(Vec3::z(), -0.8));
            transform.set_local_scale(Vec3::new(1.0, 2.0, 3.0));
        }

        let before = scene.components().transform(mover).unwrap().world_pose();
        assert!(scene.entity(mover).unwrap().set_parent(Some(inner), true));
        let transform = scene.components().transform(mover).unwrap();
        let after = transform.world_pose();

        assert_eq!(transform.parent(), Some(inner));
        assert_eq!(transform.root(), Some(outer));
        assert_relative_eq!(after.position, before.position, epsilon = TOLERANCE);
        assert_relative_eq!(after.scale, before.scale, epsilon = TOLERANCE);
        assert!(after.rotation.angle_to(&before.rotation) < TOLERANCE);
    }

    #[test]
    fn test_components_drive_hierarchy() {
        let mut manager = active_scene();
        let scene = manager.get_active_scene_mut().unwrap();
        let anchor = spawn_at(scene, Vec3::new(0.0, 1.0, 0.0));
        scene.components_mut().add_with(anchor, || Drift { speed: 2.0 });
        let follower = spawn_at(scene, Vec3::new(0.0, 5.0, 0.0));
        scene.components_mut().add_with(follower, || Adopt { target: anchor });

        // Starts run before updates, so Adopt attaches while the anchor is still at y = 1, x = 0
        let mut time = FrameTime::new(0.0, 0.5, 0);
        for _ in 0..3 {
            manager.update_active(time).unwrap();
            time = time.advanced(0.5);
        }

        let scene = manager.get_active_scene().unwrap();
        let anchor_pos = scene.components().transform(anchor).unwrap().world_position();
        let follower_ref = scene.components().transform(follower).unwrap();
        assert_relative_eq!(anchor_pos, Vec3::new(3.0, 1.0, 0.0), epsilon = TOLERANCE);
        assert_eq!(follower_ref.parent(), Some(anchor));
        assert_relative_eq!(follower_ref.local_position(), Vec3::new(0.0, 4.0, 0.0), epsilon = TOLERANCE);
        assert_relative_eq!(follower_ref.world_position(), Vec3::new(3.0, 5.0, 0.0), epsilon = TOLERANCE);
    }

    #[test]
    fn test_destroying_parent_leaves_children_in_place() {
        let mut manager = active_scene();
        let scene = manager.get_active_scene_mut().unwrap();
        let parent = spawn_at(scene, Vec3::new(1.0, 2.0, 3.0));
        let child = spawn_at(scene, Vec3::new(1.0, 0.0, 0.0));
        let grandchild = spawn_at(scene, Vec3::new(0.0, 1.0, 0.0));
        scene.entity(parent).unwrap().transform_mut().unwrap().set_local_scale(Vec3::new(2.0, 2.0, 2.0));
        scene.entity(child).unwrap().set_parent(Some(parent), false);
        scene.entity(grandchild).unwrap().set_parent(Some(child), false);
        let expected = scene.components().transform(grandchild).unwrap().world_position();

        scene.destroy_entity(parent);
        manager.update_active(FrameTime::default()).unwrap();

        let scene = manager.get_active_scene().unwrap();
        let child_ref = scene.components().transform(child).unwrap();
        assert_eq!(child_ref.parent(), None);
        assert_eq!(child_ref.children(), vec![grandchild]);
        assert_relative_eq!(
            scene.components().transform(grandchild).unwrap().world_position(),
            expected,
            epsilon = TOLERANCE
        );
        assert_eq!(scene.entities(), &[child, grandchild]);
    }
}
