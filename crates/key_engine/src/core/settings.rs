//! Engine settings and the configuration file trait
//!
//! `Settings` carries the global runtime knobs (game speed, vsync, frame
//! limiting, rendering-thread count). The `Config` trait gives any serde
//! struct toml/ron load & save by file extension.

use serde::{Deserialize, Serialize};

/// Configuration trait for serde types loadable from toml or ron files
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file, format chosen by extension
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

    /// Save configuration to file, format chosen by extension
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

/// Global engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Game-speed multiplier applied to the frame delta
    pub game_speed: f32,
    /// Whether presentation waits for vertical sync
    pub vsync: bool,
    /// Whether the frame-rate cap is enforced
    pub fps_cap: bool,
    /// Whether per-frame FPS counting is enabled
    pub fps_counting: bool,
    /// Upper frame-rate bound used when `fps_cap` is set
    pub max_fps: u32,
    /// Whether shaders are compiled ahead of time
    pub static_shader_compilation: bool,
    /// Whether render submission is spread over worker threads
    pub multithreaded_rendering: bool,
    /// Worker count used when `multithreaded_rendering` is set
    pub rendering_threads: u32,
    /// Whether the game simulation is paused
    pub paused: bool,
    /// Whether the window covers the whole screen
    pub fullscreen: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            game_speed: 1.0,
            vsync: true,
            fps_cap: false,
            fps_counting: true,
            max_fps: 60,
            static_shader_compilation: true,
            multithreaded_rendering: false,
            rendering_threads: 4,
            paused: false,
            fullscreen: false,
        }
    }
}

impl Config for Settings {}

impl Settings {
    /// Effective game speed, zero while paused
    pub fn effective_game_speed(&self) -> f32 {
        if self.paused {
            0.0
        } else {
            self.game_speed
        }
    }

    /// Frame budget in seconds when the fps cap is active
    pub fn frame_budget(&self) -> Option<f32> {
        if self.fps_cap && self.max_fps > 0 {
            Some(1.0 / self.max_fps as f32)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_expectations() {
        let s = Settings::default();
        assert_eq!(s.game_speed, 1.0);
        assert!(s.vsync);
        assert_eq!(s.max_fps, 60);
        assert_eq!(s.rendering_threads, 4);
        assert!(!s.paused);
    }

    #[test]
    fn paused_game_has_zero_speed() {
        let mut s = Settings::default();
        s.game_speed = 2.0;
        assert_eq!(s.effective_game_speed(), 2.0);
        s.paused = true;
        assert_eq!(s.effective_game_speed(), 0.0);
    }

    #[test]
    fn toml_roundtrip_preserves_overrides() {
        let mut s = Settings::default();
        s.fps_cap = true;
        s.max_fps = 144;
        let text = toml::to_string_pretty(&s).unwrap();
        let back: Settings = toml::from_str(&text).unwrap();
        assert!(back.fps_cap);
        assert_eq!(back.max_fps, 144);
        assert_eq!(back.frame_budget(), Some(1.0 / 144.0));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let back: Settings = toml::from_str("game_speed = 0.5").unwrap();
        assert_eq!(back.game_speed, 0.5);
        assert_eq!(back.max_fps, 60);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = Settings::load_from_file("config.ini").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_) | ConfigError::Io(_)));
    }
}
