use std::io::Cursor;

use image::{codecs::jpeg::JpegEncoder, ImageFormat, ImageResult, RgbImage};

pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Serializes finished tile rasters. Implementations are called concurrently from the worker
/// pool and must not depend on call order.
pub trait TileEncoder: Send + Sync {
    /// File extension, without the dot, for artifacts produced by this encoder.
    fn extension(&self) -> &'static str;

    fn encode(&self, raster: &RgbImage) -> ImageResult<Vec<u8>>;
}

/// Lossy JPEG at a fixed quality on a 1-100 scale.
#[derive(Debug, Clone, Copy)]
pub struct JpegTileEncoder {
    pub quality: u8,
}

impl Default for JpegTileEncoder {
    fn default() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl TileEncoder for JpegTileEncoder {
    fn extension(&self) -> &'static str {
        "jpg"
    }

    fn encode(&self, raster: &RgbImage) -> ImageResult<Vec<u8>> {
        let mut data = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut data, self.quality.clamp(1, 100));
            encoder.encode_image(raster)?;
        }
        Ok(data)
    }
}

/// Any format `image` can write, with that format's default settings.
#[derive(Debug, Clone, Copy)]
pub struct FormatTileEncoder(pub ImageFormat);

impl TileEncoder for FormatTileEncoder {
    fn extension(&self) -> &'static str {
        self.0.extensions_str().first().copied().unwrap_or("bin")
    }

    fn encode(&self, raster: &RgbImage) -> ImageResult<Vec<u8>> {
        let mut data = Vec::new();
        raster.write_to(&mut Cursor::new(&mut data), self.0)?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb};
    use test_case::test_case;

    fn gradient() -> RgbImage {
        RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 4) as u8, (y * 5) as u8, 128]))
    }

    #[test]
    fn jpeg_round_trips_dimensions() {
        let bytes = JpegTileEncoder::default().encode(&gradient()).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn higher_quality_is_not_smaller() {
        let low = JpegTileEncoder { quality: 20 }.encode(&gradient()).unwrap();
        let high = JpegTileEncoder { quality: 95 }.encode(&gradient()).unwrap();
        assert!(high.len() >= low.len());
    }

    #[test]
    fn png_is_lossless() {
        let raster = gradient();
        let bytes = FormatTileEncoder(ImageFormat::Png).encode(&raster).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().into_rgb8();
        assert_eq!(decoded, raster);
    }

    #[test_case(ImageFormat::Png, "png")]
    #[test_case(ImageFormat::Jpeg, "jpg")]
    #[test_case(ImageFormat::Bmp, "bmp")]
    fn extension_follows_format(format: ImageFormat, extension: &str) {
        assert_eq!(FormatTileEncoder(format).extension(), extension);
    }
}
