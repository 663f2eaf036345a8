//! # Scene Engine
//!
//! The runtime core of a 2D/3D scene engine: entities, the components attached to
//! them, their lifecycle, and a transform hierarchy with lazily recomputed world poses.
//!
//! ## Features
//!
//! - **Component lifecycle**: Awake, Start, Update and detach hooks with strict ordering
//! - **Tag ordering**: components update (and render passes draw) in [`ecs::OrderTag`] order
//! - **Safe structural changes**: adds and removes requested mid-frame are queued and
//!   applied once the pass completes
//! - **Transform hierarchy**: re-parenting that keeps world poses, dirty propagation
//! - **Headless frame driver**: [`Engine`] and the [`Application`] callbacks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! #[derive(Default)]
//! struct Spin;
//!
//! impl Component for Spin {
//!     fn update(&mut self, ctx: &mut ComponentContext<'_>) {
//!         let delta = ctx.time().delta;
//!         if let Some(mut transform) = ctx.transform_mut() {
//!             transform.rotate(utils::axis_angle(Vec3::y(), delta));
//!         }
//!     }
//! }
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn on_setup(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         let scene = engine.scenes.get_active_scene_mut()?;
//!         scene.create_game_object().add_component::<Spin>();
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::new("spin")
//!         .with_max_frames(60)
//!         .with_scene(SceneConfig::new("main").active());
//!     let mut app = MyApp;
//!     Engine::run(config, &mut app)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod ecs;
pub mod foundation;
pub mod render;
pub mod scene;

mod application;
mod engine;

pub use application::{AppError, Application};
pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        AppError, Application,
        Engine, EngineError,
        config::{Config, ConfigError, EngineConfig, SceneConfig},
        ecs::{
            Camera, Component, ComponentContext, ComponentHandle, Entity, OrderTag, Projection,
            Transform, TransformMut, TransformRef,
        },
        foundation::{
            math::{utils, Mat4, Pose, Quat, Vec3},
            time::{FrameTime, Timer},
        },
        render::{RenderPass, RenderPassController},
        scene::{GameObject, Scene, SceneError, SceneId, SceneManager},
    };
}

#[cfg(test)]
mod tests;
