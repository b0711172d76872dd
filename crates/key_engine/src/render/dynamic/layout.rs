//! Layout element tree, committing and signatures

use std::sync::Arc;

use crate::core::{EngineError, EngineResult};
use crate::foundation::collections::LruCache;

/// Element types a layout tree can contain
///
/// The leaf variants map to HLSL scalar/vector/matrix types; `Struct` and
/// `Array` are aggregates holding further elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    /// 32-bit float
    Float,
    /// Two-component float vector
    Float2,
    /// Three-component float vector
    Float3,
    /// Four-component float vector
    Float4,
    /// 4x4 float matrix
    Matrix,
    /// HLSL bool (4 bytes on the GPU)
    Bool,
    /// 32-bit signed integer
    Integer,
    /// Aggregate of named members
    Struct,
    /// Homogeneous aggregate indexed by position
    Array,
}

impl ElementType {
    /// GPU size in bytes for leaf types
    pub(crate) fn leaf_size(self) -> Option<usize> {
        match self {
            Self::Float | Self::Bool | Self::Integer => Some(4),
            Self::Float2 => Some(8),
            Self::Float3 => Some(12),
            Self::Float4 => Some(16),
            Self::Matrix => Some(64),
            Self::Struct | Self::Array => None,
        }
    }

    /// Signature tag for leaf types
    fn leaf_tag(self) -> Option<&'static str> {
        match self {
            Self::Float => Some("F1"),
            Self::Float2 => Some("F2"),
            Self::Float3 => Some("F3"),
            Self::Float4 => Some("F4"),
            Self::Matrix => Some("M4"),
            Self::Bool => Some("BL"),
            Self::Integer => Some("IN"),
            Self::Struct | Self::Array => None,
        }
    }
}

#[derive(Debug, Clone)]
enum ElementBody {
    Leaf(ElementType),
    Struct(Vec<(String, LayoutElement)>),
    Array {
        element: Option<Box<LayoutElement>>,
        count: usize,
        // element size advanced to the next register boundary; fixed at commit
        stride: usize,
    },
}

/// One node of a layout tree
///
/// Offsets are only meaningful after the owning layout has been committed.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    offset: Option<usize>,
    body: ElementBody,
}

impl LayoutElement {
    pub(crate) fn new(ty: ElementType) -> Self {
        let body = match ty {
            ElementType::Struct => ElementBody::Struct(Vec::new()),
            ElementType::Array => ElementBody::Array {
                element: None,
                count: 0,
                stride: 0,
            },
            leaf => ElementBody::Leaf(leaf),
        };
        Self { offset: None, body }
    }

    /// Element type of this node
    pub fn element_type(&self) -> ElementType {
        match &self.body {
            ElementBody::Leaf(ty) => *ty,
            ElementBody::Struct(_) => ElementType::Struct,
            ElementBody::Array { .. } => ElementType::Array,
        }
    }

    /// Add a named member to a struct element, returning the new member
    pub fn add_member(&mut self, ty: ElementType, name: &str) -> EngineResult<&mut LayoutElement> {
        let ElementBody::Struct(members) = &mut self.body else {
            return Err(EngineError::renderer(format!(
                "cannot add member '{name}' to non-struct layout element"
            )));
        };
        if !validate_member_name(name) {
            return Err(EngineError::renderer(format!(
                "invalid layout member name '{name}'"
            )));
        }
        if members.iter().any(|(n, _)| n == name) {
            return Err(EngineError::renderer(format!(
                "duplicate layout member name '{name}'"
            )));
        }
        members.push((name.to_string(), LayoutElement::new(ty)));
        Ok(&mut members.last_mut().expect("member just pushed").1)
    }

    /// Set the element type and count of an array element
    ///
    /// Returns the inner element so struct arrays can be populated further.
    pub fn set_array(&mut self, ty: ElementType, count: usize) -> EngineResult<&mut LayoutElement> {
        let ElementBody::Array { element, count: c, .. } = &mut self.body else {
            return Err(EngineError::renderer(
                "cannot set array element type on a non-array layout element",
            ));
        };
        if count == 0 {
            return Err(EngineError::renderer("array element count must be non-zero"));
        }
        *element = Some(Box::new(LayoutElement::new(ty)));
        *c = count;
        Ok(element.as_mut().expect("array element just set"))
    }

    /// Named member lookup on a struct element
    pub fn member(&self, name: &str) -> Option<&LayoutElement> {
        match &self.body {
            ElementBody::Struct(members) => {
                members.iter().find(|(n, _)| n == name).map(|(_, e)| e)
            }
            _ => None,
        }
    }

    /// Mutable named member lookup on a struct element
    pub fn member_mut(&mut self, name: &str) -> Option<&mut LayoutElement> {
        match &mut self.body {
            ElementBody::Struct(members) => members
                .iter_mut()
                .find(|(n, _)| n == name)
                .map(|(_, e)| e),
            _ => None,
        }
    }

    /// Inner element of an array
    pub fn array_element(&self) -> Option<&LayoutElement> {
        match &self.body {
            ElementBody::Array { element, .. } => element.as_deref(),
            _ => None,
        }
    }

    /// Mutable inner element of an array
    pub fn array_element_mut(&mut self) -> Option<&mut LayoutElement> {
        match &mut self.body {
            ElementBody::Array { element, .. } => element.as_deref_mut(),
            _ => None,
        }
    }

    /// Array element count and byte stride (stride valid after commit)
    pub(crate) fn array_dims(&self) -> Option<(usize, usize)> {
        match &self.body {
            ElementBody::Array { count, stride, .. } => Some((*count, *stride)),
            _ => None,
        }
    }

    /// Recursive signature uniquely identifying this (sub)layout
    pub fn signature(&self) -> String {
        match &self.body {
            ElementBody::Leaf(ty) => ty.leaf_tag().expect("leaf has a tag").to_string(),
            ElementBody::Struct(members) => {
                let mut sig = String::from("St{");
                for (name, element) in members {
                    sig.push_str(name);
                    sig.push(':');
                    sig.push_str(&element.signature());
                    sig.push(';');
                }
                sig.push('}');
                sig
            }
            ElementBody::Array { element, count, .. } => match element {
                Some(element) => format!("Ar:{count}{{{}}}", element.signature()),
                None => format!("Ar:{count}{{}}"),
            },
        }
    }

    /// Byte offset where this element begins (after commit)
    pub fn offset_begin(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    /// Byte offset just past this element (after commit)
    pub fn offset_end(&self) -> usize {
        match &self.body {
            ElementBody::Leaf(ty) => {
                self.offset_begin() + ty.leaf_size().expect("leaf has a size")
            }
            ElementBody::Struct(members) => advance_to_boundary(
                members
                    .last()
                    .map_or(self.offset_begin(), |(_, e)| e.offset_end()),
            ),
            ElementBody::Array { count, stride, .. } => self.offset_begin() + stride * count,
        }
    }

    /// Size in bytes derived from the committed offsets
    pub fn size_in_bytes(&self) -> usize {
        self.offset_end() - self.offset_begin()
    }

    /// Assign offsets to this element and its children, inserting padding
    /// per the HLSL register-boundary rules; returns the offset directly
    /// after this element
    pub(crate) fn commit(&mut self, offset_in: usize) -> EngineResult<usize> {
        match &mut self.body {
            ElementBody::Leaf(ty) => {
                let size = ty.leaf_size().expect("leaf has a size");
                let offset = advance_if_crosses_boundary(offset_in, size);
                self.offset = Some(offset);
                Ok(offset + size)
            }
            ElementBody::Struct(members) => {
                if members.is_empty() {
                    return Err(EngineError::renderer(
                        "cannot commit a struct layout element with no members",
                    ));
                }
                let offset = advance_to_boundary(offset_in);
                self.offset = Some(offset);
                let mut next = offset;
                for (_, element) in members.iter_mut() {
                    next = element.commit(next)?;
                }
                Ok(next)
            }
            ElementBody::Array { element, count, stride } => {
                let Some(element) = element.as_deref_mut() else {
                    return Err(EngineError::renderer(
                        "cannot commit an array layout element before set_array",
                    ));
                };
                let offset = advance_to_boundary(offset_in);
                self.offset = Some(offset);
                element.commit(offset)?;
                *stride = advance_to_boundary(element.size_in_bytes());
                Ok(offset + *stride * *count)
            }
        }
    }
}

/// Bump `offset` up to the next 16-byte boundary unless already on one
fn advance_to_boundary(offset: usize) -> usize {
    offset + (16 - offset % 16) % 16
}

/// Whether a block `[offset, offset + size)` straddles a register boundary
fn crosses_boundary(offset: usize, size: usize) -> bool {
    let end = offset + size;
    let page_start = offset / 16;
    let page_end = end / 16;
    (page_start != page_end && end % 16 != 0) || size > 16
}

fn advance_if_crosses_boundary(offset: usize, size: usize) -> usize {
    if crosses_boundary(offset, size) {
        advance_to_boundary(offset)
    } else {
        offset
    }
}

/// Struct member names follow identifier rules
fn validate_member_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if !first.is_ascii_digit() => {}
        _ => return false,
    }
    name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Editable layout under construction
///
/// The root is always a struct; build it up with [`RawLayout::add`] and the
/// nested element accessors, then cook it through a [`LayoutCache`].
pub struct RawLayout {
    root: LayoutElement,
}

impl Default for RawLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl RawLayout {
    /// Create a layout with an empty root struct
    pub fn new() -> Self {
        Self {
            root: LayoutElement::new(ElementType::Struct),
        }
    }

    /// Add a member to the root struct; chainable
    pub fn add(&mut self, ty: ElementType, name: &str) -> EngineResult<&mut Self> {
        self.root.add_member(ty, name)?;
        Ok(self)
    }

    /// Mutable access to a root member for nested configuration
    pub fn member_mut(&mut self, name: &str) -> Option<&mut LayoutElement> {
        self.root.member_mut(name)
    }

    /// Signature of the layout in its current shape
    pub fn signature(&self) -> String {
        self.root.signature()
    }

    /// Commit offsets and hand the root out; leaves this layout empty
    pub(crate) fn deliver(&mut self) -> EngineResult<LayoutElement> {
        let mut root = std::mem::replace(&mut self.root, LayoutElement::new(ElementType::Struct));
        root.commit(0)?;
        Ok(root)
    }
}

/// Finalized, immutable layout with committed offsets
///
/// Cheap to clone; buffers built from the same cooked layout share the tree.
#[derive(Clone)]
pub struct CookedLayout {
    root: Arc<LayoutElement>,
}

impl CookedLayout {
    /// Read access to a root member
    pub fn member(&self, name: &str) -> Option<&LayoutElement> {
        self.root.member(name)
    }

    /// Total buffer size in bytes
    pub fn size_in_bytes(&self) -> usize {
        self.root.size_in_bytes()
    }

    /// Signature uniquely identifying the layout
    pub fn signature(&self) -> String {
        self.root.signature()
    }

    /// Shared handle on the root element
    pub(crate) fn root(&self) -> Arc<LayoutElement> {
        Arc::clone(&self.root)
    }
}

/// Distinct layouts retained before the least recently used is dropped
const LAYOUT_CACHE_CAPACITY: usize = 128;

/// Codex of cooked layouts keyed by signature
///
/// Resolving the same layout shape twice yields buffers sharing one
/// committed tree. Retention is bounded; a layout evicted after
/// [`LAYOUT_CACHE_CAPACITY`] fresher ones is simply recooked on the next
/// resolve.
pub struct LayoutCache {
    map: LruCache<String, Arc<LayoutElement>>,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            map: LruCache::new(LAYOUT_CACHE_CAPACITY),
        }
    }

    /// Cook `raw`, sharing the committed tree with identical earlier layouts
    pub fn resolve(&mut self, mut raw: RawLayout) -> EngineResult<CookedLayout> {
        let signature = raw.signature();
        if let Some(root) = self.map.get(&signature) {
            return Ok(CookedLayout { root: Arc::clone(root) });
        }
        let root = Arc::new(raw.deliver()?);
        self.map.insert(signature, Arc::clone(&root));
        Ok(CookedLayout { root })
    }

    /// Number of distinct cached layouts
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cook(raw: RawLayout) -> CookedLayout {
        LayoutCache::new().resolve(raw).unwrap()
    }

    #[test]
    fn leaf_signature_tags() {
        let mut raw = RawLayout::new();
        raw.add(ElementType::Float, "a")
            .unwrap()
            .add(ElementType::Matrix, "b")
            .unwrap()
            .add(ElementType::Bool, "c")
            .unwrap();
        assert_eq!(raw.signature(), "St{a:F1;b:M4;c:BL;}");
    }

    #[test]
    fn vector_packing_respects_register_boundaries() {
        // float + float3 fit one register; the following float3 cannot
        // straddle the boundary and is pushed to the next register
        let mut raw = RawLayout::new();
        raw.add(ElementType::Float, "a")
            .unwrap()
            .add(ElementType::Float3, "b")
            .unwrap()
            .add(ElementType::Float3, "c")
            .unwrap();
        let cooked = cook(raw);
        assert_eq!(cooked.member("a").unwrap().offset_begin(), 0);
        assert_eq!(cooked.member("b").unwrap().offset_begin(), 4);
        assert_eq!(cooked.member("c").unwrap().offset_begin(), 16);
        assert_eq!(cooked.size_in_bytes(), 32);
    }

    #[test]
    fn sixteen_byte_types_never_split() {
        let mut raw = RawLayout::new();
        raw.add(ElementType::Float2, "a")
            .unwrap()
            .add(ElementType::Float4, "b")
            .unwrap();
        let cooked = cook(raw);
        assert_eq!(cooked.member("a").unwrap().offset_begin(), 0);
        // float4 would cross the first boundary at offset 8
        assert_eq!(cooked.member("b").unwrap().offset_begin(), 16);
    }

    #[test]
    fn arrays_pad_elements_to_register_stride() {
        let mut raw = RawLayout::new();
        raw.add(ElementType::Array, "arr").unwrap();
        raw.member_mut("arr")
            .unwrap()
            .set_array(ElementType::Float3, 4)
            .unwrap();
        let cooked = cook(raw);
        let arr = cooked.member("arr").unwrap();
        // each float3 element occupies a full 16-byte register
        assert_eq!(arr.array_dims(), Some((4, 16)));
        assert_eq!(arr.size_in_bytes(), 64);
        assert_eq!(cooked.signature(), "St{arr:Ar:4{F3};}");
    }

    #[test]
    fn nested_struct_array_signature_and_layout() {
        let mut raw = RawLayout::new();
        raw.add(ElementType::Array, "pts").unwrap();
        let inner = raw
            .member_mut("pts")
            .unwrap()
            .set_array(ElementType::Struct, 2)
            .unwrap();
        inner.add_member(ElementType::Float3, "pos").unwrap();
        inner.add_member(ElementType::Float, "weight").unwrap();
        let cooked = cook(raw);
        assert_eq!(cooked.signature(), "St{pts:Ar:2{St{pos:F3;weight:F1;}};}");
        let arr = cooked.member("pts").unwrap();
        let (count, stride) = arr.array_dims().unwrap();
        assert_eq!(count, 2);
        // pos (12) + weight (4) fills one register exactly
        assert_eq!(stride, 16);
    }

    #[test]
    fn member_name_rules_are_enforced() {
        let mut raw = RawLayout::new();
        assert!(raw.add(ElementType::Float, "1bad").is_err());
        assert!(raw.add(ElementType::Float, "").is_err());
        assert!(raw.add(ElementType::Float, "bad-name").is_err());
        raw.add(ElementType::Float, "good_name").unwrap();
        assert!(raw.add(ElementType::Float, "good_name").is_err());
    }

    #[test]
    fn cache_shares_identical_layout_trees() {
        let mut cache = LayoutCache::new();
        let make = || {
            let mut raw = RawLayout::new();
            raw.add(ElementType::Float4, "color").unwrap();
            raw
        };
        let a = cache.resolve(make()).unwrap();
        let b = cache.resolve(make()).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&a.root(), &b.root()));
    }

    #[test]
    fn cache_retention_is_bounded() {
        let mut cache = LayoutCache::new();
        for count in 1..=(LAYOUT_CACHE_CAPACITY + 8) {
            let mut raw = RawLayout::new();
            raw.add(ElementType::Array, "arr").unwrap();
            raw.member_mut("arr")
                .unwrap()
                .set_array(ElementType::Float, count)
                .unwrap();
            cache.resolve(raw).unwrap();
        }
        assert_eq!(cache.len(), LAYOUT_CACHE_CAPACITY);
    }

    #[test]
    fn committing_empty_struct_fails() {
        let raw = RawLayout::new();
        assert!(LayoutCache::new().resolve(raw).is_err());
    }

    #[test]
    fn committing_unset_array_fails() {
        let mut raw = RawLayout::new();
        raw.add(ElementType::Array, "arr").unwrap();
        assert!(LayoutCache::new().resolve(raw).is_err());
    }
}
