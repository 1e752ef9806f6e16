//! Export orchestration.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            prepare_session              │
//! │  style sheet, layouts, hierarchy,       │
//! │  export view state → full_box           │
//! └────────────────────┬────────────────────┘
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              ExportPlan                 │
//! │  manifests + (level, slice) passes      │
//! └────────────────────┬────────────────────┘
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           PyramidExporter               │
//! │  visibility → render → encode → write   │
//! └─────────────────────────────────────────┘
//! ```

mod driver;
mod inventory;

pub use driver::{prepare_session, ExportOptions, ExportStats, PyramidExporter};
pub use inventory::{inventory, Inventory, PassInventory};

use crate::config::ProjectConfig;
use crate::error::ExportError;
use crate::io::OutputTree;
use crate::render::RenderSession;
use crate::slice::SliceSet;

/// Load the project's design into `session` and export every planned tile.
pub fn export_project<S: RenderSession + ?Sized>(
    session: &mut S,
    config: &ProjectConfig,
    slices: SliceSet,
    options: ExportOptions,
) -> Result<ExportStats, ExportError> {
    let full_box = prepare_session(session, &config.style_sheet, &config.layouts)?;
    let output = OutputTree::new(&config.output_dir);
    PyramidExporter::new(session, slices, output, options).run(full_box, config.shape())
}
