//! # Key Engine
//!
//! A modular 3D game engine core with a headless-friendly rendering layer.
//!
//! ## Features
//!
//! - **Dynamic Constant Buffers**: runtime-described cbuffer layouts with
//!   HLSL register packing, cooked and shared through a layout codex
//! - **Render Graph**: passes wired through named, type-checked links,
//!   validated once and executed without per-frame lookups
//! - **Shared Bindables**: uid-keyed GPU state cache with garbage collection
//! - **Entity Management**: generational ids, categories and hierarchies
//! - **Messaging**: thread-safe entity message bus with per-frame dispatch
//! - **Audio**: channel/submix sound manager over pluggable sinks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use key_engine::prelude::*;
//!
//! struct MyGame;
//!
//! impl Application for MyGame {
//!     fn initialize(&mut self, engine: &mut Engine) -> EngineResult<()> {
//!         // build the render graph, load assets
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, engine: &mut Engine, delta_time: f32) -> EngineResult<()> {
//!         // game logic
//!         Ok(())
//!     }
//!
//!     fn submit(&mut self, engine: &mut Engine) -> EngineResult<()> {
//!         // queue render jobs
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> EngineResult<()> {
//!     Engine::run(Settings::default(), &mut MyGame)
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod application;
pub mod audio;
pub mod core;
pub mod engine;
pub mod events;
pub mod foundation;
pub mod render;
pub mod scene;
pub mod spatial;
pub mod tasks;

pub use application::Application;
pub use core::{EngineError, EngineResult};
pub use engine::Engine;

/// Common imports for applications built on the engine
pub mod prelude {
    pub use crate::application::Application;
    pub use crate::core::settings::{Config, Settings};
    pub use crate::core::{EngineError, EngineResult};
    pub use crate::engine::Engine;
    pub use crate::events::{Message, MessageDispatcher, MessageHandler, MessageKind};
    pub use crate::foundation::math::{Aabb, Mat4, Mat4Ext, Transform, Vec2, Vec3, Vec4};
    pub use crate::render::graph::{
        ClearSurfacePass, Job, RenderGraph, RenderQueuePass, SortOrder,
    };
    pub use crate::render::graphics::ClearValue;
    pub use crate::scene::{Camera, Category, Channels, Effect, EntityId, EntityManager, Mesh};
}
