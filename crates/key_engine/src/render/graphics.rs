//! Graphics device command interface
//!
//! Bindables and passes talk to the GPU exclusively through
//! [`GraphicsDevice`]; the engine itself never names a concrete API. The
//! built-in [`RecordingDevice`] appends every call to a command log, which
//! backs headless runs and the rendering tests.

/// Clear value for a render surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// RGBA color clear
    Color([f32; 4]),
    /// Depth clear
    Depth(f32),
}

/// Command sink the render layer draws through
pub trait GraphicsDevice {
    /// Bind interleaved vertex bytes with the given per-vertex stride
    fn bind_vertex_data(&mut self, signature: &str, bytes: &[u8], stride: usize);

    /// Bind triangle list indices
    fn bind_index_data(&mut self, indices: &[u32]);

    /// Upload and bind constant-buffer bytes at `slot`
    fn bind_constant_buffer(&mut self, slot: u32, bytes: &[u8]);

    /// Bind a named shader pipeline
    fn bind_pipeline(&mut self, name: &str);

    /// Upload and bind RGBA8 texel data at `slot`
    fn bind_texture(&mut self, slot: u32, width: u32, height: u32, texels: &[u8]);

    /// Select the color attachment to render into
    fn set_color_target(&mut self, surface: &str);

    /// Select the depth attachment to render into
    fn set_depth_target(&mut self, surface: &str);

    /// Clear a named surface
    fn clear_surface(&mut self, surface: &str, value: ClearValue);

    /// Issue an indexed draw with the current bindings
    fn draw_indexed(&mut self, index_count: u32);
}

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    /// Vertex data bound (layout signature, byte length, stride)
    BindVertexData {
        /// Layout signature of the bound data
        signature: String,
        /// Total byte length
        byte_len: usize,
        /// Per-vertex stride
        stride: usize,
    },
    /// Index data bound
    BindIndexData {
        /// Number of indices
        index_count: usize,
    },
    /// Constant buffer bound
    BindConstantBuffer {
        /// Target slot
        slot: u32,
        /// Uploaded byte length
        byte_len: usize,
    },
    /// Pipeline bound
    BindPipeline {
        /// Pipeline name
        name: String,
    },
    /// Texture bound
    BindTexture {
        /// Target slot
        slot: u32,
        /// Texel width
        width: u32,
        /// Texel height
        height: u32,
    },
    /// Color target selected
    SetColorTarget {
        /// Surface name
        surface: String,
    },
    /// Depth target selected
    SetDepthTarget {
        /// Surface name
        surface: String,
    },
    /// Surface cleared
    ClearSurface {
        /// Surface name
        surface: String,
        /// Clear value
        value: ClearValue,
    },
    /// Indexed draw issued
    DrawIndexed {
        /// Number of indices drawn
        index_count: u32,
    },
}

/// Headless device that records commands instead of submitting them
#[derive(Default)]
pub struct RecordingDevice {
    commands: Vec<DeviceCommand>,
}

impl RecordingDevice {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded so far, in call order
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Number of draw calls recorded
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DeviceCommand::DrawIndexed { .. }))
            .count()
    }

    /// Forget all recorded commands
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl GraphicsDevice for RecordingDevice {
    fn bind_vertex_data(&mut self, signature: &str, bytes: &[u8], stride: usize) {
        self.commands.push(DeviceCommand::BindVertexData {
            signature: signature.to_string(),
            byte_len: bytes.len(),
            stride,
        });
    }

    fn bind_index_data(&mut self, indices: &[u32]) {
        self.commands.push(DeviceCommand::BindIndexData {
            index_count: indices.len(),
        });
    }

    fn bind_constant_buffer(&mut self, slot: u32, bytes: &[u8]) {
        self.commands.push(DeviceCommand::BindConstantBuffer {
            slot,
            byte_len: bytes.len(),
        });
    }

    fn bind_pipeline(&mut self, name: &str) {
        self.commands.push(DeviceCommand::BindPipeline {
            name: name.to_string(),
        });
    }

    fn bind_texture(&mut self, slot: u32, width: u32, height: u32, _texels: &[u8]) {
        self.commands.push(DeviceCommand::BindTexture {
            slot,
            width,
            height,
        });
    }

    fn set_color_target(&mut self, surface: &str) {
        self.commands.push(DeviceCommand::SetColorTarget {
            surface: surface.to_string(),
        });
    }

    fn set_depth_target(&mut self, surface: &str) {
        self.commands.push(DeviceCommand::SetDepthTarget {
            surface: surface.to_string(),
        });
    }

    fn clear_surface(&mut self, surface: &str, value: ClearValue) {
        self.commands.push(DeviceCommand::ClearSurface {
            surface: surface.to_string(),
            value,
        });
    }

    fn draw_indexed(&mut self, index_count: u32) {
        self.commands.push(DeviceCommand::DrawIndexed { index_count });
    }
}
