//! Tile pyramid layout.
//!
//! - [`levels`]: per-level tile grid (`subdiv`, `tile_size`)
//! - [`dzi`]: manifest XML and tile file names
//! - [`plan`]: the manifests and slice passes of one export run

pub mod dzi;
pub mod levels;
pub mod plan;

pub use dzi::{parse_tile_coords, DziManifest};
pub use levels::{LevelGeometry, PyramidShape};
pub use plan::{
    level_dir, manifest_path, tile_path, ExportPlan, LevelSummary, ManifestJob, PlanSummary,
    SlicePass, SliceSummary, TileJob,
};
