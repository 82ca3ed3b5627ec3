//! Texture decoding to CPU-side RGBA8 pixels.

use std::path::Path;

use crate::error::{AssetError, AssetResult};

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supported texture formats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureFormat {
    Rgba8,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::Rgba8 => 4,
        }
    }
}

impl TextureData {
    /// Wrap raw RGBA8 pixels, checking the buffer matches the dimensions.
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> AssetResult<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(AssetError::TextureSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
        })
    }

    /// Decode an image file (PNG) into RGBA8.
    pub fn load(path: impl AsRef<Path>) -> AssetResult<Self> {
        let path = path.as_ref();
        log::info!("Loading texture from {}", path.display());

        let img = image::open(path).map_err(|source| AssetError::Texture {
            path: path.to_path_buf(),
            source,
        })?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let data = rgba.into_raw();

        log::info!("Loaded texture {}x{} with {} bytes", width, height, data.len());

        Self::new_rgba8(width, height, data)
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        self.format.bytes_per_pixel()
    }

    /// Check if the texture data is valid.
    pub fn is_valid(&self) -> bool {
        let expected_size = self.width as usize * self.height as usize * self.bytes_per_pixel() as usize;
        self.data.len() == expected_size && self.width > 0 && self.height > 0
    }
}
