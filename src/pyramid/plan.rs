//! Export planning.
//!
//! A plan lists the manifests and the per-slice, per-level passes of an
//! export run. Tiles are derived on demand from each pass's level grid, so
//! planning and summarizing a pyramid costs nothing per tile.

use serde::Serialize;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use super::dzi::{DziManifest, TILE_FORMAT};
use super::levels::{LevelGeometry, PyramidShape};
use crate::geometry::{zoom, DBox};
use crate::slice::{SliceDefinition, SliceSet};

/// Manifest file name for a slice, relative to the output directory.
pub fn manifest_path(slice: &str) -> PathBuf {
    PathBuf::from(format!("{slice}.dzi"))
}

/// Tile directory of one slice and level, relative to the output directory.
pub fn level_dir(slice: &str, level: u32) -> PathBuf {
    PathBuf::from(format!("{slice}_files")).join(level.to_string())
}

/// Tile path `<slice>_files/<level>/<x>_<y>.png`, relative to the output
/// directory.
pub fn tile_path(slice: &str, level: u32, x: u32, y: u32) -> PathBuf {
    level_dir(slice, level).join(format!("{x}_{y}.{TILE_FORMAT}"))
}

/// One tile to render.
#[derive(Debug, Clone, PartialEq)]
pub struct TileJob {
    pub x: u32,
    pub y: u32,
    pub viewport: DBox,
    pub path: PathBuf,
}

/// All tiles of one slice at one level, rendered under one visibility setting.
#[derive(Debug, Clone, PartialEq)]
pub struct SlicePass {
    pub slice: SliceDefinition,
    pub level: LevelGeometry,
    pub dir: PathBuf,
    pub full_box: DBox,
}

impl SlicePass {
    /// Tiles in export order, rows top to bottom.
    pub fn tiles(&self) -> impl Iterator<Item = TileJob> + '_ {
        self.level.coordinates().map(move |(x, y)| TileJob {
            x,
            y,
            viewport: zoom(&self.full_box, self.level.subdiv, x, y),
            path: tile_path(&self.slice.name, self.level.level, x, y),
        })
    }

    pub fn tile_count(&self) -> u64 {
        self.level.tile_count()
    }
}

/// A manifest to write.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestJob {
    pub slice: String,
    pub path: PathBuf,
    pub manifest: DziManifest,
}

/// Complete, ordered description of an export run.
#[derive(Debug, Clone)]
pub struct ExportPlan {
    pub shape: PyramidShape,
    pub full_box: DBox,
    pub manifests: Vec<ManifestJob>,
    /// Level-major, then slices in stack order
    pub passes: Vec<SlicePass>,
}

impl ExportPlan {
    /// Plan all levels of `shape` for every slice.
    pub fn build(full_box: DBox, slices: &SliceSet, shape: PyramidShape) -> Self {
        Self::build_levels(full_box, slices, shape, 0..=shape.zoom_depth)
    }

    /// Plan only `levels` (clamped to the pyramid). Manifests are always
    /// planned for every slice.
    pub fn build_levels(
        full_box: DBox,
        slices: &SliceSet,
        shape: PyramidShape,
        levels: RangeInclusive<u32>,
    ) -> Self {
        let manifest = DziManifest::for_shape(&shape);
        let manifests = slices
            .slices()
            .iter()
            .map(|s| ManifestJob {
                slice: s.name.clone(),
                path: manifest_path(&s.name),
                manifest,
            })
            .collect();

        let first = *levels.start();
        let last = (*levels.end()).min(shape.zoom_depth);
        let mut passes = Vec::new();
        for level in (first..=last).map(|l| shape.level(l)) {
            for slice in slices.slices() {
                passes.push(SlicePass {
                    slice: slice.clone(),
                    level,
                    dir: level_dir(&slice.name, level.level),
                    full_box,
                });
            }
        }

        Self {
            shape,
            full_box,
            manifests,
            passes,
        }
    }

    pub fn tile_count(&self) -> u64 {
        self.passes.iter().map(SlicePass::tile_count).sum()
    }

    pub fn summary(&self) -> PlanSummary {
        let mut levels: Vec<LevelSummary> = Vec::new();
        for pass in &self.passes {
            if levels.last().map(|l| l.level) != Some(pass.level.level) {
                levels.push(LevelSummary {
                    level: pass.level.level,
                    subdiv: pass.level.subdiv,
                    tile_size: pass.level.tile_size,
                    tiles_per_slice: pass.level.tile_count(),
                    pixel_extent: pass.level.pixel_extent(),
                });
            }
        }

        let slices = self
            .manifests
            .iter()
            .map(|m| SliceSummary {
                name: m.slice.clone(),
                tiles: self
                    .passes
                    .iter()
                    .filter(|p| p.slice.name == m.slice)
                    .map(SlicePass::tile_count)
                    .sum(),
            })
            .collect();

        PlanSummary {
            full_box: self.full_box,
            tile_size: self.shape.tile_size(),
            width: self.shape.dimension(),
            height: self.shape.dimension(),
            levels,
            slices,
            total_tiles: self.tile_count(),
        }
    }
}

/// Serializable overview of a plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    pub full_box: DBox,
    pub tile_size: u32,
    pub width: u32,
    pub height: u32,
    pub levels: Vec<LevelSummary>,
    pub slices: Vec<SliceSummary>,
    pub total_tiles: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelSummary {
    pub level: u32,
    pub subdiv: u32,
    pub tile_size: u32,
    pub tiles_per_slice: u64,
    pub pixel_extent: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SliceSummary {
    pub name: String,
    pub tiles: u64,
}
