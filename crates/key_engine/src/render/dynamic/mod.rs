//! Dynamic constant-buffer layout system
//!
//! Describes GPU constant-buffer layouts at runtime as a tree of typed
//! elements (leaves, structs, arrays), commits the tree into byte offsets
//! that follow HLSL cbuffer packing (16-byte register boundaries), and pairs
//! a committed layout with a raw byte buffer for typed element access.
//!
//! Layouts are built through [`RawLayout`], finalized into shared immutable
//! [`CookedLayout`]s by the [`LayoutCache`] codex (keyed by signature so
//! identical layouts share one tree), and consumed by [`Buffer`].

mod buffer;
mod layout;

pub use buffer::{Buffer, ElementRef, ElementRefMut, LeafValue};
pub use layout::{CookedLayout, ElementType, LayoutCache, LayoutElement, RawLayout};
