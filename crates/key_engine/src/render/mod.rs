//! Rendering layer
//!
//! Organized around three ideas:
//! - [`dynamic`] and [`vertex`] describe constant-buffer and vertex layouts
//!   at runtime instead of compile time
//! - [`bindable`] wraps GPU state in shareable objects keyed by uid
//! - [`graph`] wires render passes together through validated, typed links
//!
//! Everything reaches the GPU through the [`graphics::GraphicsDevice`]
//! trait, so the whole layer runs headless under the recording device.

pub mod bindable;
pub mod dynamic;
pub mod graph;
pub mod graphics;
#[cfg(feature = "textures")]
pub mod texture;
pub mod vertex;
