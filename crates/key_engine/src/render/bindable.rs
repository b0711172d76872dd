//! Shared render bindables
//!
//! A bindable is an immutable-by-default piece of GPU state (vertex data,
//! pipeline, render surface, constant buffer) that knows how to bind itself
//! to a [`GraphicsDevice`]. Bindables are shared across meshes through the
//! uid-keyed [`BindableCache`] codex so identical state is created once.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::dynamic::Buffer;
use super::graphics::{ClearValue, GraphicsDevice};
use super::vertex::VertexBufferData;

/// GPU state object bindable to a device
pub trait Bindable: Send + Sync {
    /// Unique id identifying equal bindables for sharing
    fn uid(&self) -> &str;

    /// Bind this state to the device
    fn bind(&self, device: &mut dyn GraphicsDevice);

    /// Downcast support for typed graph links
    fn as_any(&self) -> &dyn Any;
}

/// Interleaved vertex data bindable
pub struct VertexData {
    uid: String,
    data: VertexBufferData,
}

impl VertexData {
    /// Wrap vertex data under a sharing uid (usually the mesh name)
    pub fn new(tag: &str, data: VertexBufferData) -> Self {
        Self {
            uid: format!("vtx#{tag}#{}", data.layout().signature()),
            data,
        }
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.data.vertex_count()
    }
}

impl Bindable for VertexData {
    fn uid(&self) -> &str {
        &self.uid
    }

    fn bind(&self, device: &mut dyn GraphicsDevice) {
        device.bind_vertex_data(
            &self.data.layout().signature(),
            self.data.bytes(),
            self.data.layout().stride(),
        );
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Triangle index list bindable
pub struct IndexData {
    uid: String,
    indices: Vec<u32>,
}

impl IndexData {
    /// Wrap an index list under a sharing uid
    pub fn new(tag: &str, indices: Vec<u32>) -> Self {
        Self {
            uid: format!("idx#{tag}"),
            indices,
        }
    }

    /// Number of indices
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}

impl Bindable for IndexData {
    fn uid(&self) -> &str {
        &self.uid
    }

    fn bind(&self, device: &mut dyn GraphicsDevice) {
        device.bind_index_data(&self.indices);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Named shader pipeline bindable
pub struct Pipeline {
    uid: String,
    name: String,
}

impl Pipeline {
    /// Reference a pipeline by name
    pub fn new(name: &str) -> Self {
        Self {
            uid: format!("pso#{name}"),
            name: name.to_string(),
        }
    }

    /// Pipeline name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Bindable for Pipeline {
    fn uid(&self) -> &str {
        &self.uid
    }

    fn bind(&self, device: &mut dyn GraphicsDevice) {
        device.bind_pipeline(&self.name);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Role a render surface plays when bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Color attachment
    Color,
    /// Depth attachment
    Depth,
}

/// Render target or depth buffer bindable
///
/// Surfaces flow between passes through graph links; binding one selects it
/// as the current attachment of its kind.
pub struct RenderSurface {
    uid: String,
    name: String,
    kind: SurfaceKind,
}

impl RenderSurface {
    /// Create a named surface
    pub fn new(name: &str, kind: SurfaceKind) -> Self {
        Self {
            uid: format!("srf#{name}"),
            name: name.to_string(),
            kind,
        }
    }

    /// Surface name as known to the device
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attachment role
    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    /// Clear this surface on the device
    pub fn clear(&self, device: &mut dyn GraphicsDevice, value: ClearValue) {
        device.clear_surface(&self.name, value);
    }
}

impl Bindable for RenderSurface {
    fn uid(&self) -> &str {
        &self.uid
    }

    fn bind(&self, device: &mut dyn GraphicsDevice) {
        match self.kind {
            SurfaceKind::Color => device.set_color_target(&self.name),
            SurfaceKind::Depth => device.set_depth_target(&self.name),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Constant buffer bindable over a dynamic-layout byte buffer
///
/// Updates happen through [`ConstantBuffer::update`] under a lock, so the
/// same buffer can be shared by several meshes and refreshed per frame.
pub struct ConstantBuffer {
    uid: String,
    slot: u32,
    buffer: Mutex<Buffer>,
}

impl ConstantBuffer {
    /// Wrap a buffer targeting constant slot `slot`
    pub fn new(tag: &str, slot: u32, buffer: Buffer) -> Self {
        Self {
            uid: format!("cbuf#{tag}#{slot}#{}", buffer.signature()),
            slot,
            buffer: Mutex::new(buffer),
        }
    }

    /// Target slot
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Mutate the buffer contents in place
    pub fn update<R>(&self, f: impl FnOnce(&mut Buffer) -> R) -> R {
        let mut buffer = self.buffer.lock().unwrap();
        f(&mut buffer)
    }
}

impl Bindable for ConstantBuffer {
    fn uid(&self) -> &str {
        &self.uid
    }

    fn bind(&self, device: &mut dyn GraphicsDevice) {
        let buffer = self.buffer.lock().unwrap();
        device.bind_constant_buffer(self.slot, buffer.bytes());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Uid-keyed codex of shared bindables
#[derive(Default)]
pub struct BindableCache {
    map: HashMap<String, Arc<dyn Bindable>>,
}

impl BindableCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the bindable stored under `uid`, creating it with `make` on a
    /// miss
    pub fn fetch_or_insert<B, F>(&mut self, uid: &str, make: F) -> Arc<dyn Bindable>
    where
        B: Bindable + 'static,
        F: FnOnce() -> B,
    {
        if let Some(existing) = self.map.get(uid) {
            return Arc::clone(existing);
        }
        let created: Arc<dyn Bindable> = Arc::new(make());
        debug_assert_eq!(created.uid(), uid);
        self.map.insert(uid.to_string(), Arc::clone(&created));
        created
    }

    /// Look up a bindable without creating it
    pub fn fetch(&self, uid: &str) -> Option<Arc<dyn Bindable>> {
        self.map.get(uid).map(Arc::clone)
    }

    /// Number of cached bindables
    pub fn instance_count(&self) -> usize {
        self.map.len()
    }

    /// Number of bindables no longer referenced outside the cache
    pub fn garbage_count(&self) -> usize {
        self.map
            .values()
            .filter(|b| Arc::strong_count(b) <= 1)
            .count()
    }

    /// Drop bindables no longer referenced outside the cache
    pub fn garbage_collect(&mut self) -> usize {
        let before = self.map.len();
        self.map.retain(|_, b| Arc::strong_count(b) > 1);
        let collected = before - self.map.len();
        if collected > 0 {
            log::debug!("bindable cache collected {collected} unused bindables");
        }
        collected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::graphics::{DeviceCommand, RecordingDevice};
    use crate::render::vertex::{AttributeKind, VertexLayout};

    fn triangle_vertex_data() -> VertexBufferData {
        let mut layout = VertexLayout::new();
        layout.append(AttributeKind::Position3D).unwrap();
        VertexBufferData::with_vertices(layout, 3)
    }

    #[test]
    fn cache_shares_by_uid() {
        let mut cache = BindableCache::new();
        let a = cache.fetch_or_insert("pso#flat", || Pipeline::new("flat"));
        let b = cache.fetch_or_insert("pso#flat", || Pipeline::new("flat"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.instance_count(), 1);
    }

    #[test]
    fn garbage_collect_drops_unreferenced() {
        let mut cache = BindableCache::new();
        let kept = cache.fetch_or_insert("pso#keep", || Pipeline::new("keep"));
        {
            let _dropped = cache.fetch_or_insert("pso#drop", || Pipeline::new("drop"));
        }
        assert_eq!(cache.instance_count(), 2);
        assert_eq!(cache.garbage_count(), 1);
        assert_eq!(cache.garbage_collect(), 1);
        assert_eq!(cache.instance_count(), 1);
        assert!(cache.fetch(kept.uid()).is_some());
        assert!(cache.fetch("pso#drop").is_none());
    }

    #[test]
    fn bindables_issue_their_device_calls() {
        let mut device = RecordingDevice::new();
        VertexData::new("tri", triangle_vertex_data()).bind(&mut device);
        IndexData::new("tri", vec![0, 1, 2]).bind(&mut device);
        Pipeline::new("flat").bind(&mut device);
        RenderSurface::new("backbuffer", SurfaceKind::Color).bind(&mut device);
        RenderSurface::new("depth", SurfaceKind::Depth).bind(&mut device);
        assert_eq!(
            device.commands(),
            &[
                DeviceCommand::BindVertexData {
                    signature: "P3".into(),
                    byte_len: 36,
                    stride: 12
                },
                DeviceCommand::BindIndexData { index_count: 3 },
                DeviceCommand::BindPipeline { name: "flat".into() },
                DeviceCommand::SetColorTarget { surface: "backbuffer".into() },
                DeviceCommand::SetDepthTarget { surface: "depth".into() },
            ]
        );
    }

    #[test]
    fn constant_buffer_uploads_current_bytes() {
        use crate::render::dynamic::{ElementType, LayoutCache, RawLayout};

        let mut raw = RawLayout::new();
        raw.add(ElementType::Float4, "tint").unwrap();
        let buffer = Buffer::from_raw(&mut LayoutCache::new(), raw).unwrap();
        let cbuf = ConstantBuffer::new("mat", 1, buffer);
        cbuf.update(|b| b.set_if_exists("tint", &[1.0_f32, 0.0, 0.0, 1.0]));

        let mut device = RecordingDevice::new();
        cbuf.bind(&mut device);
        assert_eq!(
            device.commands(),
            &[DeviceCommand::BindConstantBuffer { slot: 1, byte_len: 16 }]
        );
    }
}
