//! Scene layer
//!
//! Entities live in the slotmap-backed [`EntityManager`]; drawable geometry
//! is a [`Mesh`] carrying one [`Effect`] per rendering technique, submitted
//! into the render graph each frame from the active [`Camera`]'s point of
//! view.

mod camera;
mod effect;
mod entity;
mod material;
mod mesh;

pub use camera::Camera;
pub use effect::{Channels, Effect};
pub use entity::{Category, Entity, EntityId, EntityManager};
pub use material::Material;
pub use mesh::Mesh;
