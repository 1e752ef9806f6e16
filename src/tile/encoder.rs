//! PNG tile encoder.
//!
//! Tiles are written losslessly; the only compression is what the PNG
//! encoder itself applies.

use bytes::Bytes;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};

use crate::error::TileError;

/// A rendered tile ready to be encoded.
#[derive(Debug, Clone, PartialEq)]
pub enum TileImage {
    /// Opaque tile rendered on the export background
    Opaque(RgbImage),
    /// Tile with a recovered transparency mask
    Transparent(RgbaImage),
}

impl TileImage {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            TileImage::Opaque(img) => img.dimensions(),
            TileImage::Transparent(img) => img.dimensions(),
        }
    }
}

// =============================================================================
// PNG Encoder
// =============================================================================

/// PNG tile encoder.
///
/// # Example
///
/// ```
/// use image::RgbImage;
/// use layout_tiler::tile::{PngTileEncoder, TileImage};
///
/// let encoder = PngTileEncoder::new();
/// let png = encoder.encode(&TileImage::Opaque(RgbImage::new(4, 4))).unwrap();
/// assert_eq!(&png[1..4], b"PNG");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PngTileEncoder {
    compression: CompressionType,
}

impl PngTileEncoder {
    pub fn new() -> Self {
        Self {
            compression: CompressionType::Default,
        }
    }

    /// Use the fastest compression; handy for large exploratory exports.
    pub fn fast() -> Self {
        Self {
            compression: CompressionType::Fast,
        }
    }

    /// Encode a tile to PNG bytes.
    pub fn encode(&self, tile: &TileImage) -> Result<Bytes, TileError> {
        let (width, height) = tile.dimensions();
        let (data, color): (&[u8], ExtendedColorType) = match tile {
            TileImage::Opaque(img) => (img.as_raw(), ExtendedColorType::Rgb8),
            TileImage::Transparent(img) => (img.as_raw(), ExtendedColorType::Rgba8),
        };

        let mut output = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut output, self.compression, FilterType::Adaptive);
        encoder
            .write_image(data, width, height, color)
            .map_err(|e| TileError::EncodeError {
                message: e.to_string(),
            })?;

        Ok(Bytes::from(output))
    }
}

impl Default for PngTileEncoder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
