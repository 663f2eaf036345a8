//! # Configuration System
//!
//! Serializable configuration for the frame driver and the scenes it creates at
//! startup. Files are loaded as TOML or RON depending on their extension.

pub use serde::{Serialize, Deserialize};

use log::LevelFilter;
use std::path::Path;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            ConfigFormat::Ron => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Ron,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// A scene the frame driver creates before the first frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Scene name, unique within the scene manager
    pub name: String,
    /// Whether this scene becomes the active scene once created
    #[serde(default)]
    pub activate: bool,
}

impl SceneConfig {
    /// Create a scene entry
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            activate: false,
        }
    }

    /// Mark this scene as the one to activate
    pub fn active(mut self) -> Self {
        self.activate = true;
        self
    }
}

/// # Engine Configuration
///
/// Core frame driver behavior: logging, timing and the scenes created at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Application name, used in log output
    pub application_name: String,
    /// Log level filter (`error`, `warn`, `info`, `debug`, `trace`, `off`)
    pub log_level: String,
    /// Fixed simulation step in seconds; wall-clock timing when `None`
    pub fixed_delta_time: Option<f32>,
    /// Stop after this many frames; run until the application quits when `None`
    pub max_frames: Option<u64>,
    /// Scenes created before `on_setup`
    pub scenes: Vec<SceneConfig>,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            application_name: app_name.into(),
            log_level: "info".to_string(),
            fixed_delta_time: None,
            max_frames: None,
            scenes: Vec::new(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Use a fixed simulation step
    pub fn with_fixed_delta(mut self, delta: f32) -> Self {
        self.fixed_delta_time = Some(delta);
        self
    }

    /// Stop after a number of frames
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    /// Add a startup scene
    pub fn with_scene(mut self, scene: SceneConfig) -> Self {
        self.scenes.push(scene);
        self
    }

    /// Parsed log level
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown log level '{}'", self.log_level)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_name.is_empty() {
            return Err(ConfigError::Invalid("application name cannot be empty".to_string()));
        }

        self.level_filter()?;

        if let Some(delta) = self.fixed_delta_time {
            if !(delta.is_finite() && delta > 0.0) {
                return Err(ConfigError::Invalid(format!("fixed delta time must be positive, got {}", delta)));
            }
        }

        let active = self.scenes.iter().filter(|scene| scene.activate).count();
        if active > 1 {
            return Err(ConfigError::Invalid(format!("{} scenes marked active, at most one allowed", active)));
        }

        for (index, scene) in self.scenes.iter().enumerate() {
            if scene.name.is_empty() {
                return Err(ConfigError::Invalid(format!("scene #{} has an empty name", index)));
            }
            if self.scenes[..index].iter().any(|other| other.name == scene.name) {
                return Err(ConfigError::Invalid(format!("duplicate scene name '{}'", scene.name)));
            }
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new("Scene Engine Application")
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Info);
    }

    #[test]
    fn test_rejects_two_active_scenes() {
        let config = EngineConfig::default()
            .with_scene(SceneConfig::new("a").active())
            .with_scene(SceneConfig::new("b").active());

        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_duplicate_scene_names_and_bad_level() {
        let duplicate = EngineConfig::default()
            .with_scene(SceneConfig::new("main"))
            .with_scene(SceneConfig::new("main"));
        assert!(duplicate.validate().is_err());

        let bad_level = EngineConfig::default().with_log_level("loud");
        assert!(bad_level.validate().is_err());

        let bad_delta = EngineConfig::default().with_fixed_delta(0.0);
        assert!(bad_delta.validate().is_err());
    }

    #[test]
    fn test_toml_parses_partial_config() {
        let text = r#"
            application_name = "demo"
            max_frames = 10

            [[scenes]]
            name = "main"
            activate = true
        "#;

        let config: EngineConfig = toml::from_str(text).unwrap();

        assert_eq!(config.application_name, "demo");
        assert_eq!(config.max_frames, Some(10));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.scenes, vec![SceneConfig::new("main").active()]);
    }

    #[test]
    fn test_round_trip_through_ron_file() {
        let path = std::env::temp_dir().join(format!("scene_engine_config_{}.ron", std::process::id()));
        let config = EngineConfig::new("ron test")
            .with_fixed_delta(0.5)
            .with_scene(SceneConfig::new("level"));

        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = EngineConfig::default().save_to_file("config.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
