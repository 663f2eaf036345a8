//! Application trait and lifecycle management

use crate::config::ConfigError;
use crate::engine::{Engine, EngineError};
use crate::scene::SceneError;
use thiserror::Error;

/// Application lifecycle trait
///
/// Implement this trait to drive scenes with the headless [`Engine`]. Callbacks run in
/// this order: `on_load`, `on_setup`, then `on_step` and `on_draw` once per frame, and
/// `on_close` when the loop ends.
pub trait Application {
    /// Load assets or external data
    ///
    /// Called once before any scene exists beyond those in the engine configuration.
    fn on_load(&mut self, _engine: &mut Engine) -> Result<(), AppError> {
        Ok(())
    }

    /// Build the initial scenes and entities
    fn on_setup(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Called every frame after the active scene updated
    ///
    /// # Arguments
    /// * `engine` - Mutable reference to the engine
    /// * `total` - Seconds since the loop started
    /// * `delta` - Seconds since the previous frame
    fn on_step(&mut self, _engine: &mut Engine, _total: f32, _delta: f32) -> Result<(), AppError> {
        Ok(())
    }

    /// Called every frame after the render passes ran
    fn on_draw(&mut self, _engine: &mut Engine, _delta: f32) -> Result<(), AppError> {
        Ok(())
    }

    /// Called once when the loop ends
    fn on_close(&mut self, _engine: &mut Engine) {}
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Scene registry error
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}
