//! Byte buffer paired with a cooked layout for typed element access

use std::sync::Arc;

use crate::core::{EngineError, EngineResult};

use super::layout::{CookedLayout, ElementType, LayoutCache, LayoutElement, RawLayout};

/// Rust-side value types that map onto layout leaf elements
///
/// Implementations read and write the GPU byte representation; `bool` widens
/// to the 4-byte HLSL bool.
pub trait LeafValue: Sized {
    /// Whether `ty` is the leaf type this value maps to
    fn matches(ty: ElementType) -> bool;

    /// Decode a value from its GPU bytes
    fn read(bytes: &[u8]) -> Self;

    /// Encode a value into its GPU bytes
    fn write(&self, bytes: &mut [u8]);
}

macro_rules! pod_leaf {
    ($rust:ty, $variant:ident) => {
        impl LeafValue for $rust {
            fn matches(ty: ElementType) -> bool {
                ty == ElementType::$variant
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

pod_leaf!(f32, Float);
pod_leaf!([f32; 2], Float2);
pod_leaf!([f32; 3], Float3);
pod_leaf!([f32; 4], Float4);
pod_leaf!([[f32; 4]; 4], Matrix);
pod_leaf!(i32, Integer);

impl LeafValue for bool {
    fn matches(ty: ElementType) -> bool {
        ty == ElementType::Bool
    }

    fn read(bytes: &[u8]) -> Self {
        bytes[..4].iter().any(|&b| b != 0)
    }

    fn write(&self, bytes: &mut [u8]) {
        bytes[..4].copy_from_slice(&u32::from(*self).to_le_bytes());
    }
}

/// Read-only view of one element inside a [`Buffer`]
///
/// Views formed with an unknown member name or out-of-range index are inert:
/// [`ElementRef::exists`] is `false` and reads yield `None`. This lets shader
/// code probe optional members without branching at every site.
#[derive(Clone, Copy)]
pub struct ElementRef<'a> {
    element: Option<&'a LayoutElement>,
    bytes: &'a [u8],
    array_offset: usize,
}

impl<'a> ElementRef<'a> {
    /// Whether the view refers to a real element
    pub fn exists(&self) -> bool {
        self.element.is_some()
    }

    /// View of a named member of a struct element
    pub fn index(&self, name: &str) -> ElementRef<'a> {
        ElementRef {
            element: self.element.and_then(|e| e.member(name)),
            bytes: self.bytes,
            array_offset: self.array_offset,
        }
    }

    /// View of the `i`-th element of an array element
    pub fn at(&self, i: usize) -> ElementRef<'a> {
        let (element, extra) = indexed(self.element, i);
        ElementRef {
            element,
            bytes: self.bytes,
            array_offset: self.array_offset + extra,
        }
    }

    /// Read the leaf value, if the element exists and has type `T`
    pub fn read<T: LeafValue>(&self) -> Option<T> {
        let element = self.element?;
        if !T::matches(element.element_type()) {
            return None;
        }
        let begin = self.array_offset + element.offset_begin();
        Some(T::read(&self.bytes[begin..]))
    }
}

/// Mutable view of one element inside a [`Buffer`]
pub struct ElementRefMut<'a> {
    element: Option<&'a LayoutElement>,
    bytes: &'a mut [u8],
    array_offset: usize,
}

impl<'a> ElementRefMut<'a> {
    /// Whether the view refers to a real element
    pub fn exists(&self) -> bool {
        self.element.is_some()
    }

    /// Mutable view of a named member of a struct element
    pub fn index(self, name: &str) -> ElementRefMut<'a> {
        ElementRefMut {
            element: self.element.and_then(|e| e.member(name)),
            bytes: self.bytes,
            array_offset: self.array_offset,
        }
    }

    /// Mutable view of the `i`-th element of an array element
    pub fn at(self, i: usize) -> ElementRefMut<'a> {
        let (element, extra) = indexed(self.element, i);
        ElementRefMut {
            element,
            bytes: self.bytes,
            array_offset: self.array_offset + extra,
        }
    }

    /// Read the leaf value, if the element exists and has type `T`
    pub fn read<T: LeafValue>(&self) -> Option<T> {
        let element = self.element?;
        if !T::matches(element.element_type()) {
            return None;
        }
        let begin = self.array_offset + element.offset_begin();
        Some(T::read(&self.bytes[begin..]))
    }

    /// Write the leaf value; returns whether a write happened
    ///
    /// A missing element or a type mismatch leaves the buffer untouched and
    /// returns `false`, so optional shader members can be set blindly.
    pub fn write<T: LeafValue>(&mut self, value: &T) -> bool {
        let Some(element) = self.element else {
            return false;
        };
        if !T::matches(element.element_type()) {
            return false;
        }
        let begin = self.array_offset + element.offset_begin();
        value.write(&mut self.bytes[begin..]);
        true
    }
}

fn indexed<'a>(
    element: Option<&'a LayoutElement>,
    i: usize,
) -> (Option<&'a LayoutElement>, usize) {
    let Some(element) = element else {
        return (None, 0);
    };
    let Some((count, stride)) = element.array_dims() else {
        return (None, 0);
    };
    if i >= count {
        return (None, 0);
    }
    (element.array_element(), stride * i)
}

/// Constant-buffer bytes structured by a cooked layout
pub struct Buffer {
    root: Arc<LayoutElement>,
    bytes: Vec<u8>,
}

impl Buffer {
    /// Allocate a zero-filled buffer for `layout`
    pub fn new(layout: &CookedLayout) -> Self {
        let root = layout.root();
        let bytes = vec![0; root.size_in_bytes()];
        Self { root, bytes }
    }

    /// Cook `raw` through `cache` and allocate a buffer for it
    pub fn from_raw(cache: &mut LayoutCache, raw: RawLayout) -> EngineResult<Self> {
        Ok(Self::new(&cache.resolve(raw)?))
    }

    /// Read-only view of a root member
    pub fn element(&self, name: &str) -> ElementRef<'_> {
        ElementRef {
            element: self.root.member(name),
            bytes: &self.bytes,
            array_offset: 0,
        }
    }

    /// Mutable view of a root member
    pub fn element_mut(&mut self, name: &str) -> ElementRefMut<'_> {
        ElementRefMut {
            element: self.root.member(name),
            bytes: &mut self.bytes,
            array_offset: 0,
        }
    }

    /// Write a root leaf member only if it exists with type `T`
    pub fn set_if_exists<T: LeafValue>(&mut self, name: &str, value: &T) -> bool {
        self.element_mut(name).write(value)
    }

    /// Raw bytes ready for upload
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Buffer size in bytes
    pub fn size_in_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Signature of the underlying layout
    pub fn signature(&self) -> String {
        self.root.signature()
    }

    /// Copy another buffer's bytes; the layouts must be identical
    pub fn copy_from(&mut self, other: &Buffer) -> EngineResult<()> {
        if !Arc::ptr_eq(&self.root, &other.root) && self.signature() != other.signature() {
            return Err(EngineError::renderer(format!(
                "cannot copy between buffers with different layouts ({} vs {})",
                self.signature(),
                other.signature()
            )));
        }
        self.bytes.copy_from_slice(&other.bytes);
        Ok(())
    }
}
