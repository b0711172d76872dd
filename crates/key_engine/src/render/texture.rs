//! Texture bindable

use std::any::Any;
use std::path::Path;

use crate::core::{EngineError, EngineResult};

use super::bindable::Bindable;
use super::graphics::GraphicsDevice;

/// RGBA8 texture bindable
///
/// Texels live CPU-side and are uploaded on bind, which keeps the type
/// device-agnostic.
pub struct Texture {
    uid: String,
    slot: u32,
    width: u32,
    height: u32,
    texels: Vec<u8>,
}

impl Texture {
    /// Wrap raw RGBA8 texels
    pub fn from_texels(
        tag: &str,
        slot: u32,
        width: u32,
        height: u32,
        texels: Vec<u8>,
    ) -> EngineResult<Self> {
        if texels.len() != (width * height * 4) as usize {
            return Err(EngineError::renderer(format!(
                "texture '{tag}' has {} bytes, expected {} for {width}x{height} RGBA8",
                texels.len(),
                width * height * 4
            )));
        }
        Ok(Self {
            uid: format!("tex#{tag}#{slot}"),
            slot,
            width,
            height,
            texels,
        })
    }

    /// Load an image file, converting to RGBA8
    pub fn from_file(tag: &str, slot: u32, path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|e| {
                EngineError::renderer(format!("cannot load texture '{}': {e}", path.display()))
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();
        Self::from_texels(tag, slot, width, height, image.into_raw())
    }

    /// Texel width
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Texel height
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Target slot
    pub fn slot(&self) -> u32 {
        self.slot
    }
}

impl Bindable for Texture {
    fn uid(&self) -> &str {
        &self.uid
    }

    fn bind(&self, device: &mut dyn GraphicsDevice) {
        device.bind_texture(self.slot, self.width, self.height, &self.texels);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::graphics::{DeviceCommand, RecordingDevice};

    #[test]
    fn bind_uploads_dimensions() {
        let texture = Texture::from_texels("checker", 0, 2, 2, vec![255; 16]).unwrap();
        let mut device = RecordingDevice::new();
        texture.bind(&mut device);
        assert_eq!(
            device.commands(),
            &[DeviceCommand::BindTexture { slot: 0, width: 2, height: 2 }]
        );
    }

    #[test]
    fn texel_size_is_validated() {
        assert!(Texture::from_texels("bad", 0, 2, 2, vec![0; 3]).is_err());
    }
}
