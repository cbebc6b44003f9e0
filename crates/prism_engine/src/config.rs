//! Configuration system
//!
//! Engine configuration with file loading support for TOML and RON.

use serde::{Deserialize, Serialize};

/// Configuration trait for types loadable from TOML or RON files
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
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
}

/// Engine startup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// RGBA color the color buffer is cleared to each frame
    pub clear_color: [f32; 4],

    /// Whether the ground-plane grid overlay is drawn
    pub show_grid: bool,

    /// Whether debug-UI elements are drawn after the 3D passes
    pub show_debug_ui: bool,

    /// Window title, handed to the windowing layer by the application
    pub window_title: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            show_grid: false,
            show_debug_ui: true,
            window_title: "prism".to_string(),
        }
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine_startup_state() {
        let config = EngineConfig::default();
        assert_eq!(config.clear_color, [0.0, 0.0, 0.0, 1.0]);
        assert!(!config.show_grid);
        assert!(config.show_debug_ui);
    }

    #[test]
    fn test_toml_round_trip() {
        let path = std::env::temp_dir().join("prism_engine_config_test.toml");
        let path = path.to_str().unwrap().to_string();

        let mut config = EngineConfig::default();
        config.show_grid = true;
        config.clear_color = [0.1, 0.2, 0.3, 1.0];
        config.save_to_file(&path).unwrap();

        let loaded = EngineConfig::load_from_file(&path).unwrap();
        assert!(loaded.show_grid);
        assert_eq!(loaded.clear_color, config.clear_color);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_ron_round_trip() {
        let path = std::env::temp_dir().join("prism_engine_config_test.ron");
        let path = path.to_str().unwrap().to_string();

        let config = EngineConfig::default();
        config.save_to_file(&path).unwrap();

        let loaded = EngineConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.window_title, config.window_title);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        assert!(matches!(
            EngineConfig::load_from_file("engine.yaml"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
