//! Zoom level geometry.
//!
//! Level 0 is a single pixel covering the whole design; every level doubles
//! resolution along both axes up to `zoom_depth`. Tiles have a fixed edge of
//! `2^tile_size_exp` pixels, so levels up to `tile_size_exp` fit in one tile
//! and deeper levels split into a `subdiv × subdiv` grid.

use serde::Serialize;

/// Tile grid of one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelGeometry {
    pub level: u32,
    /// Tiles per axis
    pub subdiv: u32,
    /// Tile edge in pixels
    pub tile_size: u32,
}

impl LevelGeometry {
    pub fn new(level: u32, tile_size_exp: u32) -> Self {
        if level > tile_size_exp {
            Self {
                level,
                subdiv: 1 << (level - tile_size_exp),
                tile_size: 1 << tile_size_exp,
            }
        } else {
            Self {
                level,
                subdiv: 1,
                tile_size: 1 << level,
            }
        }
    }

    pub fn tile_count(&self) -> u64 {
        u64::from(self.subdiv) * u64::from(self.subdiv)
    }

    /// Image edge in pixels at this level.
    pub fn pixel_extent(&self) -> u64 {
        u64::from(self.subdiv) * u64::from(self.tile_size)
    }

    /// Tile coordinates in export order: rows top to bottom, columns left to
    /// right within a row.
    pub fn coordinates(&self) -> impl Iterator<Item = (u32, u32)> {
        let subdiv = self.subdiv;
        (0..subdiv).flat_map(move |y| (0..subdiv).map(move |x| (x, y)))
    }
}

/// Size parameters of the whole pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PyramidShape {
    pub tile_size_exp: u32,
    pub zoom_depth: u32,
}

impl PyramidShape {
    pub fn new(tile_size_exp: u32, zoom_depth: u32) -> Self {
        Self {
            tile_size_exp,
            zoom_depth,
        }
    }

    /// Tile edge in pixels as declared in the manifest.
    pub fn tile_size(&self) -> u32 {
        1 << self.tile_size_exp
    }

    /// Full-resolution image edge in pixels.
    pub fn dimension(&self) -> u32 {
        1 << self.zoom_depth
    }

    pub fn level(&self, level: u32) -> LevelGeometry {
        LevelGeometry::new(level, self.tile_size_exp)
    }

    /// All levels `0..=zoom_depth`.
    pub fn levels(&self) -> impl Iterator<Item = LevelGeometry> {
        let exp = self.tile_size_exp;
        (0..=self.zoom_depth).map(move |l| LevelGeometry::new(l, exp))
    }
}
