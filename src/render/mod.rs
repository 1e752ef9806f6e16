//! Rendering engine abstraction.
//!
//! The exporter never draws geometry itself. It drives a [`RenderSession`],
//! which owns the loaded design, the layer list with its visibility flags and
//! the background/overlay configuration, and rasterizes arbitrary viewports.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          Pyramid Export Driver          │
//! └────────────────────┬────────────────────┘
//!                      │ ViewState, visibility, viewports
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │          RenderSession Trait            │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │   VectorEngine (style sheet + JSON      │
//! │   geometry, scanline rasterizer)        │
//! └─────────────────────────────────────────┘
//! ```

pub mod engine;
mod layout;
mod raster;
mod state;
pub mod style;

use image::{Rgb, RgbImage};
use std::path::Path;

use crate::error::EngineError;
use crate::geometry::DBox;

pub use engine::{VectorEngine, DEFAULT_GRID_PITCH, DEFAULT_OVERSAMPLING};
pub use layout::LayoutFile;
pub use state::{Overlays, ViewState, BLACK, WHITE};
pub use style::{LayerKey, StyleSheet};

/// A layer as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerInfo {
    /// Display name, conventionally `name.datatype - purpose`
    pub name: String,
    pub visible: bool,
}

/// One rendering engine session holding one loaded design.
///
/// Layer indices are positions in the list returned by [`layers`](Self::layers)
/// and stay stable until another file is loaded.
pub trait RenderSession {
    /// Load the layer style sheet (colors, fills, display names).
    fn load_style_sheet(&mut self, path: &Path) -> Result<(), EngineError>;

    /// Load a geometry file and merge it into the current view.
    fn load_layout(&mut self, path: &Path) -> Result<(), EngineError>;

    /// Show the full cell hierarchy instead of only top-level shapes.
    fn expand_hierarchy(&mut self);

    /// Bounding box of all loaded geometry.
    fn bounding_box(&self) -> Result<DBox, EngineError>;

    /// All layers known to the view, in drawing order.
    fn layers(&self) -> Vec<LayerInfo>;

    /// Change the visibility flag of one layer.
    fn set_layer_visible(&mut self, index: usize, visible: bool);

    /// Recompute displayed content after visibility changes.
    ///
    /// Engines do not pick up visibility changes until this is called.
    fn refresh(&mut self);

    fn set_background(&mut self, color: Rgb<u8>);

    fn set_overlays(&mut self, overlays: Overlays);

    /// Rasterize `viewport` into a `width × height` opaque image.
    fn render(&mut self, width: u32, height: u32, viewport: &DBox)
        -> Result<RgbImage, EngineError>;

    /// Whether the first real render after setup returns stale content unless
    /// a throwaway render is done first.
    fn needs_warm_up(&self) -> bool {
        false
    }
}
