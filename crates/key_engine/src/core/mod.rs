//! Core engine services: error hierarchy, settings, RNG, game states

pub mod error;
pub mod random;
pub mod settings;
pub mod state;

pub use error::{EngineError, EngineResult};
pub use random::Random;
pub use settings::{Config, ConfigError, Settings};
pub use state::{State, StateMachine};
