//! Headless frame driver

use crate::{
    application::Application,
    config::{ConfigError, EngineConfig},
    foundation::{logging, time::{FrameTime, Timer}},
    render::RenderPassController,
    scene::{SceneError, SceneManager},
};
use thiserror::Error;

/// Main engine struct
///
/// Owns the scenes and the render passes and advances them one frame at a time.
pub struct Engine {
    /// Scene registry and active scene
    pub scenes: SceneManager,

    /// Render passes run after every step
    pub render_passes: RenderPassController,

    /// Frame timing
    timer: Timer,

    /// Engine configuration
    config: EngineConfig,

    /// Whether the engine should continue running
    running: bool,
}

impl Engine {
    /// Create an engine and the scenes listed in `config`
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        log::info!("Initializing engine for '{}'...", config.application_name);

        let mut scenes = SceneManager::new();
        for scene in &config.scenes {
            let id = scenes.create_scene(Some(scene.name.as_str()))?;
            if scene.activate {
                scenes.set_active_scene(id)?;
            }
        }

        let timer = match config.fixed_delta_time {
            Some(step) => Timer::fixed(step),
            None => Timer::new(),
        };

        Ok(Self {
            scenes,
            render_passes: RenderPassController::new(),
            timer,
            config,
            running: true,
        })
    }

    /// Run the main loop with the given application until it quits or the frame
    /// limit is reached
    pub fn run<T: Application>(config: EngineConfig, app: &mut T) -> Result<(), EngineError> {
        logging::init_with_level(config.level_filter()?);
        let mut engine = Self::new(config)?;

        app.on_load(&mut engine)
            .map_err(|e| EngineError::ApplicationError(format!("App load: {}", e)))?;
        app.on_setup(&mut engine)
            .map_err(|e| EngineError::ApplicationError(format!("App setup: {}", e)))?;

        log::info!("Starting main loop...");

        let result = engine.run_loop(app);

        app.on_close(&mut engine);
        log::info!(
            "Engine shutdown complete after {} frames ({:.1} fps average)",
            engine.timer.frame_count(),
            engine.timer.average_fps()
        );
        result
    }

    fn run_loop<T: Application>(&mut self, app: &mut T) -> Result<(), EngineError> {
        while self.running {
            let time = self.step()?;
            app.on_step(self, time.total, time.delta)
                .map_err(|e| EngineError::ApplicationError(format!("App step: {}", e)))?;

            self.draw(&time)?;
            app.on_draw(self, time.delta)
                .map_err(|e| EngineError::ApplicationError(format!("App draw: {}", e)))?;
        }
        Ok(())
    }

    /// Advance the clock and update the active scene
    pub fn step(&mut self) -> Result<FrameTime, EngineError> {
        self.timer.update();
        let time = self.timer.frame_time();
        self.scenes.update_active(time)?;

        if self.config.max_frames.is_some_and(|max| self.timer.frame_count() >= max) {
            log::debug!("Frame limit reached");
            self.running = false;
        }
        Ok(time)
    }

    /// Run the render passes over the active scene
    pub fn draw(&mut self, time: &FrameTime) -> Result<(), EngineError> {
        let scene = self.scenes.get_active_scene()?;
        self.render_passes.draw_all(scene, time);
        Ok(())
    }

    /// Stop the loop after the current frame
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Whether the loop keeps going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Frame timing
    pub fn timer(&self) -> &Timer {
        &self.timer
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scene registry error
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Application error
    #[error("Application error: {0}")]
    ApplicationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::AppError;
    use crate::config::SceneConfig;
    use crate::ecs::{Component, ComponentContext, OrderTag};
    use crate::render::RenderPass;
    use crate::scene::Scene;
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct Ticker {
        ticks: u32,
    }

    impl Component for Ticker {
        fn update(&mut self, _ctx: &mut ComponentContext<'_>) {
            self.ticks += 1;
        }
    }

    struct CountingPass {
        draws: std::rc::Rc<std::cell::Cell<u32>>,
    }

    impl RenderPass for CountingPass {
        fn tag(&self) -> OrderTag {
            OrderTag::Render
        }

        fn name(&self) -> &str {
            "count"
        }

        fn draw(&mut self, scene: &Scene, _time: &FrameTime) {
            assert_eq!(scene.name(), "main");
            self.draws.set(self.draws.get() + 1);
        }
    }

    #[derive(Default)]
    struct TestApp {
        steps: Vec<f32>,
        draws: std::rc::Rc<std::cell::Cell<u32>>,
        closed: bool,
        ticks: u32,
    }

    impl Application for TestApp {
        fn on_setup(&mut self, engine: &mut Engine) -> Result<(), AppError> {
            engine.render_passes.add_pass(Box::new(CountingPass { draws: self.draws.clone() }));
            let scene = engine.scenes.get_active_scene_mut()?;
            let entity = scene.create_entity();
            scene.components_mut().add::<Ticker>(entity);
            Ok(())
        }

        fn on_step(&mut self, _engine: &mut Engine, total: f32, _delta: f32) -> Result<(), AppError> {
            self.steps.push(total);
            Ok(())
        }

        fn on_close(&mut self, engine: &mut Engine) {
            self.closed = true;
            self.ticks = engine
                .scenes
                .get_active_scene()
                .map(|scene| scene.components().get_all::<Ticker>().map(|t| t.ticks).sum())
                .unwrap_or_default();
        }
    }

    fn config() -> EngineConfig {
        EngineConfig::new("test")
            .with_fixed_delta(0.5)
            .with_max_frames(4)
            .with_scene(SceneConfig::new("main").active())
    }

    #[test]
    fn test_run_drives_fixed_frames() {
        let mut app = TestApp::default();

        Engine::run(config(), &mut app).unwrap();

        assert_eq!(app.steps.len(), 4);
        assert_relative_eq!(app.steps[3], 2.0);
        assert_eq!(app.draws.get(), 4);
        // Start and the first update both run in frame one
        assert_eq!(app.ticks, 4);
        assert!(app.closed);
    }

    #[test]
    fn test_step_without_active_scene_fails() {
        let mut engine = Engine::new(EngineConfig::new("test")).unwrap();

        let result = engine.step();

        assert!(matches!(result, Err(EngineError::Scene(SceneError::NoActiveScene))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig::new("test").with_log_level("loud");

        assert!(matches!(Engine::new(config), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_quit_stops_loop() {
        let mut engine = Engine::new(config()).unwrap();
        assert!(engine.is_running());

        engine.quit();

        assert!(!engine.is_running());
        assert_eq!(engine.config().application_name, "test");
    }
}
