use std::path::Path;

use image::{DynamicImage, GenericImageView, RgbaImage};

use crate::errors::TileError;

/// A decoded source bitmap. Read-only for the duration of a run and shared by every worker.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    pub fn new(image: DynamicImage) -> Result<Self, TileError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(TileError::decode(format!(
                "decoded image is empty ({width}x{height})"
            )));
        }
        Ok(Self {
            pixels: image.into_rgba8(),
        })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, TileError> {
        let image = image::load_from_memory(bytes).map_err(|e| TileError::decode(e.to_string()))?;
        Self::new(image)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TileError> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|e| TileError::decode(format!("{}: {}", path.display(), e)))?;
        Self::new(image)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}
