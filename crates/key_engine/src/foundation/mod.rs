//! Foundation utilities shared by every engine subsystem
//!
//! Math types, frame timing, and the LRU cache the higher layers build on.

pub mod collections;
pub mod math;
pub mod time;

pub use collections::LruCache;
pub use math::{Aabb, Mat4, Transform, Vec2, Vec3, Vec4};
pub use time::{Stopwatch, Timer};
