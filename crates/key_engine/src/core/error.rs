//! Engine error hierarchy
//!
//! One enum per failure domain, mirrored from the subsystem boundaries:
//! renderer, gameplay, utility, configuration, audio and task scheduling.

use crate::core::settings::ConfigError;

/// Result alias used throughout the engine
pub type EngineResult<T> = Result<T, EngineError>;

/// Top-level engine error
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// Renderer or render-graph failure
    #[error("renderer error: {0}")]
    Renderer(String),

    /// Gameplay-layer failure
    #[error("gameplay error: {0}")]
    Gameplay(String),

    /// Generic utility failure
    #[error("utility error: {0}")]
    Util(String),

    /// Configuration loading or saving failure
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Audio device or channel failure
    #[error("audio error: {0}")]
    Audio(String),

    /// Thread-pool or task scheduling failure
    #[error("task error: {0}")]
    Tasks(String),
}

impl EngineError {
    /// Build a renderer error from any displayable message
    pub fn renderer(msg: impl Into<String>) -> Self {
        Self::Renderer(msg.into())
    }

    /// Build a gameplay error from any displayable message
    pub fn gameplay(msg: impl Into<String>) -> Self {
        Self::Gameplay(msg.into())
    }
}
