//! Runtime-described vertex layouts and buffers
//!
//! A [`VertexLayout`] is an ordered list of attributes with computed byte
//! offsets; a [`VertexBufferData`] is the matching interleaved CPU-side
//! vertex array with typed per-attribute access. Layouts carry a short tag
//! signature used to pair vertex data with compatible shaders.

use crate::core::{EngineError, EngineResult};

/// Vertex attribute kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// 2D position
    Position2D,
    /// 3D position
    Position3D,
    /// Texture coordinates
    Texture2D,
    /// Surface normal
    Normal,
    /// Tangent
    Tangent,
    /// Bitangent
    Bitangent,
    /// RGB float color
    Float3Color,
    /// RGBA float color
    Float4Color,
    /// Packed 8-bit BGRA color
    BgraColor,
}

impl AttributeKind {
    /// Attribute size in bytes
    pub fn size_in_bytes(self) -> usize {
        match self {
            Self::Position2D | Self::Texture2D => 8,
            Self::Position3D
            | Self::Normal
            | Self::Tangent
            | Self::Bitangent
            | Self::Float3Color => 12,
            Self::Float4Color => 16,
            Self::BgraColor => 4,
        }
    }

    /// Short tag used in layout signatures
    pub fn tag(self) -> &'static str {
        match self {
            Self::Position2D => "P2",
            Self::Position3D => "P3",
            Self::Texture2D => "T2",
            Self::Normal => "N",
            Self::Tangent => "Nt",
            Self::Bitangent => "Nb",
            Self::Float3Color => "C3",
            Self::Float4Color => "C4",
            Self::BgraColor => "C9",
        }
    }
}

/// Rust-side value types that map onto vertex attributes
pub trait VertexValue: Sized {
    /// Whether this value type can back attribute `kind`
    fn matches(kind: AttributeKind) -> bool;

    /// Decode a value from interleaved vertex bytes
    fn read(bytes: &[u8]) -> Self;

    /// Encode a value into interleaved vertex bytes
    fn write(&self, bytes: &mut [u8]);
}

macro_rules! vertex_value {
    ($rust:ty, $($variant:ident)|+) => {
        impl VertexValue for $rust {
            fn matches(kind: AttributeKind) -> bool {
                matches!(kind, $(AttributeKind::$variant)|+)
            }

            fn read(bytes: &[u8]) -> Self {
                bytemuck::pod_read_unaligned(&bytes[..std::mem::size_of::<Self>()])
            }

            fn write(&self, bytes: &mut [u8]) {
                bytes[..std::mem::size_of::<Self>()].copy_from_slice(bytemuck::bytes_of(self));
            }
        }
    };
}

vertex_value!([f32; 2], Position2D | Texture2D);
vertex_value!([f32; 3], Position3D | Normal | Tangent | Bitangent | Float3Color);
vertex_value!([f32; 4], Float4Color);
vertex_value!([u8; 4], BgraColor);

/// Ordered attribute list with computed offsets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexLayout {
    attributes: Vec<(AttributeKind, usize)>,
    stride: usize,
}

impl VertexLayout {
    /// Create an empty layout
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute; chainable, rejects duplicates
    pub fn append(&mut self, kind: AttributeKind) -> EngineResult<&mut Self> {
        if self.has(kind) {
            return Err(EngineError::renderer(format!(
                "vertex layout already contains attribute {kind:?}"
            )));
        }
        self.attributes.push((kind, self.stride));
        self.stride += kind.size_in_bytes();
        Ok(self)
    }

    /// Whether the layout contains `kind`
    pub fn has(&self, kind: AttributeKind) -> bool {
        self.attributes.iter().any(|(k, _)| *k == kind)
    }

    /// Byte offset of `kind` within one vertex
    pub fn offset_of(&self, kind: AttributeKind) -> Option<usize> {
        self.attributes
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, offset)| *offset)
    }

    /// Bytes per vertex
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of attributes
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Attributes in declaration order
    pub fn attributes(&self) -> impl Iterator<Item = AttributeKind> + '_ {
        self.attributes.iter().map(|(k, _)| *k)
    }

    /// Concatenated attribute tags, e.g. `P3NT2`
    pub fn signature(&self) -> String {
        self.attributes.iter().map(|(k, _)| k.tag()).collect()
    }
}

/// Interleaved CPU-side vertex array described by a [`VertexLayout`]
pub struct VertexBufferData {
    layout: VertexLayout,
    bytes: Vec<u8>,
}

impl VertexBufferData {
    /// Create an empty buffer for `layout`
    pub fn new(layout: VertexLayout) -> Self {
        Self {
            layout,
            bytes: Vec::new(),
        }
    }

    /// Create a zero-filled buffer holding `vertex_count` vertices
    pub fn with_vertices(layout: VertexLayout, vertex_count: usize) -> Self {
        let bytes = vec![0; layout.stride() * vertex_count];
        Self { layout, bytes }
    }

    /// The describing layout
    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        if self.layout.stride() == 0 {
            0
        } else {
            self.bytes.len() / self.layout.stride()
        }
    }

    /// Append a zero-filled vertex, returning its index
    pub fn push_vertex(&mut self) -> usize {
        let index = self.vertex_count();
        self.bytes.resize(self.bytes.len() + self.layout.stride(), 0);
        index
    }

    /// Write one attribute of one vertex; `false` on bad index, missing
    /// attribute or type mismatch
    pub fn write<T: VertexValue>(&mut self, vertex: usize, kind: AttributeKind, value: &T) -> bool {
        if !T::matches(kind) || vertex >= self.vertex_count() {
            return false;
        }
        let Some(offset) = self.layout.offset_of(kind) else {
            return false;
        };
        let begin = vertex * self.layout.stride() + offset;
        value.write(&mut self.bytes[begin..]);
        true
    }

    /// Read one attribute of one vertex
    pub fn read<T: VertexValue>(&self, vertex: usize, kind: AttributeKind) -> Option<T> {
        if !T::matches(kind) || vertex >= self.vertex_count() {
            return None;
        }
        let offset = self.layout.offset_of(kind)?;
        let begin = vertex * self.layout.stride() + offset;
        Some(T::read(&self.bytes[begin..]))
    }

    /// Raw interleaved bytes ready for upload
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}
