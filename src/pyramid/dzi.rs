//! Deep Zoom Image (DZI) manifests and tile file names.
//!
//! # DZI Format Overview
//!
//! A DZI pyramid is an XML manifest `<name>.dzi` next to a directory
//! `<name>_files/` holding one subdirectory per level with `<x>_<y>.<fmt>`
//! tiles. Viewers number levels from 0 (1x1 pixel) up to the level whose
//! size is the full image.

use super::levels::PyramidShape;

/// Deep Zoom XML namespace.
pub const DZI_NAMESPACE: &str = "http://schemas.microsoft.com/deepzoom/2008";

/// Tile image format written by the exporter.
pub const TILE_FORMAT: &str = "png";

/// Contents of a `.dzi` manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DziManifest {
    pub tile_size: u32,
    pub overlap: u32,
    pub width: u32,
    pub height: u32,
}

impl DziManifest {
    /// Manifest for a square pyramid; independent of which levels get exported.
    pub fn for_shape(shape: &PyramidShape) -> Self {
        Self {
            tile_size: shape.tile_size(),
            overlap: 0,
            width: shape.dimension(),
            height: shape.dimension(),
        }
    }

    /// Render the manifest XML.
    ///
    /// # Example Output
    ///
    /// ```xml
    /// <?xml version="1.0" encoding="UTF-8"?>
    /// <Image xmlns="http://schemas.microsoft.com/deepzoom/2008" Format="png" Overlap="0" TileSize="512">
    ///   <Size Height="4096" Width="4096" />
    /// </Image>
    /// ```
    pub fn to_xml(&self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <Image xmlns=\"{DZI_NAMESPACE}\" Format=\"{TILE_FORMAT}\" Overlap=\"{overlap}\" TileSize=\"{tile_size}\">\n\
             \x20 <Size Height=\"{height}\" Width=\"{width}\" />\n\
             </Image>\n",
            overlap = self.overlap,
            tile_size = self.tile_size,
            height = self.height,
            width = self.width,
        )
    }
}

/// Parse tile coordinates from a file name like `"3_5.png"` or `"3_5"`.
///
/// Returns `(x, y)`.
pub fn parse_tile_coords(filename: &str) -> Option<(u32, u32)> {
    let name = filename.strip_suffix(".png").unwrap_or(filename);

    let (x, y) = name.split_once('_')?;
    if y.contains('_') {
        return None;
    }

    Some((x.parse().ok()?, y.parse().ok()?))
}
