//! # layout-tiler
//!
//! Exports a chip layout as a set of Deep Zoom Image (DZI) tile pyramids,
//! one per fabrication slice.
//!
//! A slice is a subset of mask layers (front-end, each metal level, the
//! bump-bond redistribution layers). For every slice the exporter writes a
//! `.dzi` manifest and renders every tile of every zoom level with only that
//! slice's layers visible, so a web viewer can stack the pyramids and let the
//! user peel the chip apart layer by layer.
//!
//! ## Features
//!
//! - **Slice visibility**: explicit layer sets or cumulative stack thresholds
//! - **Exact tiling**: tiles of one level share edges exactly and cover the
//!   whole design without overlap
//! - **Transparent tiles**: alpha recovered from a black and a white render
//! - **Pluggable engine**: anything implementing [`RenderSession`], with a
//!   built-in [`VectorEngine`] for TOML style sheets and JSON geometry
//!
//! ## Architecture
//!
//! - [`geometry`] - design-space boxes and the tile grid mapper
//! - [`slice`] - mask layer identities, slice definitions, visibility
//! - [`render`] - the engine abstraction and the built-in engine
//! - [`tile`] - alpha recovery and PNG encoding
//! - [`pyramid`] - level geometry, DZI manifests, export plans
//! - [`export`] - the export driver
//! - [`io`] - atomic writes into the output tree
//! - [`config`] - project file and CLI types
//!
//! ## Example
//!
//! ```rust,no_run
//! use layout_tiler::{export_project, ExportOptions, ProjectConfig, VectorEngine};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ProjectConfig::load("project.toml".as_ref())?;
//!     let slices = config.slice_set()?;
//!     let options = ExportOptions::transparent(0..=config.zoom_depth);
//!
//!     let mut engine = VectorEngine::with_oversampling(config.oversampling);
//!     let stats = export_project(&mut engine, &config, slices, options)?;
//!     println!("{} tiles written", stats.tiles);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod io;
pub mod pyramid;
pub mod render;
pub mod slice;
pub mod tile;

// Re-export commonly used types
pub use config::{CheckArgs, Cli, Command, ExportArgs, PlanArgs, ProjectArgs, ProjectConfig};
pub use error::{ConfigError, EngineError, ExportError, TileError};
pub use export::{
    export_project, inventory, prepare_session, ExportOptions, ExportStats, Inventory,
    PassInventory, PyramidExporter,
};
pub use geometry::{zoom, DBox};
pub use io::OutputTree;
pub use pyramid::{
    parse_tile_coords, DziManifest, ExportPlan, LevelGeometry, PlanSummary, PyramidShape,
};
pub use render::{LayerInfo, Overlays, RenderSession, VectorEngine, ViewState};
pub use slice::{
    change_slice, malformed_layers, MaskLayerIdentity, SliceDefinition, SliceSet, SliceSpec,
};
pub use tile::{compose_transparent, recover_alpha, PngTileEncoder, TileImage};
