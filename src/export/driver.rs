//! Pyramid export driver.
//!
//! Executes an [`ExportPlan`] against a [`RenderSession`]. Within a level each
//! slice is finished (visibility applied, every tile written) before the next
//! slice starts, since visibility is single-valued engine state.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Instant;

use image::RgbImage;
use tracing::{debug, info, warn};

use crate::config::ProjectConfig;
use crate::error::{EngineError, ExportError, TileError};
use crate::geometry::DBox;
use crate::io::OutputTree;
use crate::pyramid::{ExportPlan, PyramidShape, SlicePass, TileJob};
use crate::render::{RenderSession, ViewState, BLACK, WHITE};
use crate::slice::{change_slice, malformed_layers, SliceSet};
use crate::tile::{compose_transparent, unpremultiply, PngTileEncoder, TileImage};

/// How tiles are rendered and which levels are produced.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Two renders per tile with recovered alpha instead of one opaque render
    pub transparent: bool,
    /// Divide colors by the recovered alpha (transparent mode only)
    pub unpremultiply: bool,
    /// Levels to render; manifests are written regardless
    pub levels: RangeInclusive<u32>,
    pub encoder: PngTileEncoder,
}

impl ExportOptions {
    pub fn opaque(levels: RangeInclusive<u32>) -> Self {
        Self {
            transparent: false,
            unpremultiply: false,
            levels,
            encoder: PngTileEncoder::new(),
        }
    }

    pub fn transparent(levels: RangeInclusive<u32>) -> Self {
        Self {
            transparent: true,
            ..Self::opaque(levels)
        }
    }

    /// Tile mode of a project, rendering `levels`.
    pub fn from_config(config: &ProjectConfig, levels: RangeInclusive<u32>) -> Self {
        Self {
            transparent: config.transparent,
            unpremultiply: config.unpremultiply,
            ..Self::opaque(levels)
        }
    }
}

/// Counters reported after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub manifests: usize,
    pub passes: usize,
    pub tiles: usize,
    pub renders: usize,
}

/// Load the design into `session` and configure it for export.
///
/// Returns the design extent.
pub fn prepare_session<S: RenderSession + ?Sized>(
    session: &mut S,
    style_sheet: &Path,
    layouts: &[PathBuf],
) -> Result<DBox, EngineError> {
    info!("Loading design");
    session.load_style_sheet(style_sheet)?;
    for layout in layouts {
        session.load_layout(layout)?;
    }
    session.expand_hierarchy();
    ViewState::export().apply(session);

    let full_box = session.bounding_box()?;
    info!(
        left = full_box.left,
        bottom = full_box.bottom,
        right = full_box.right,
        top = full_box.top,
        "Design extent"
    );
    Ok(full_box)
}

/// Renders planned tiles and writes them with their manifests.
pub struct PyramidExporter<'s, S: RenderSession + ?Sized> {
    session: &'s mut S,
    slices: SliceSet,
    output: OutputTree,
    options: ExportOptions,
    view: ViewState,
    stats: ExportStats,
}

impl<'s, S: RenderSession + ?Sized> PyramidExporter<'s, S> {
    pub fn new(
        session: &'s mut S,
        slices: SliceSet,
        output: OutputTree,
        options: ExportOptions,
    ) -> Self {
        Self {
            session,
            slices,
            output,
            options,
            view: ViewState::export(),
            stats: ExportStats::default(),
        }
    }

    /// Plan the configured levels for `full_box` and export them.
    pub fn run(&mut self, full_box: DBox, shape: PyramidShape) -> Result<ExportStats, ExportError> {
        let levels = self.options.levels.clone();
        let plan = ExportPlan::build_levels(full_box, &self.slices, shape, levels);
        info!(
            slices = self.slices.slices().len(),
            passes = plan.passes.len(),
            tiles = plan.tile_count(),
            transparent = self.options.transparent,
            "Planned export"
        );
        self.execute(&plan)
    }

    /// Write all manifests, then every pass of `plan` in order.
    pub fn execute(&mut self, plan: &ExportPlan) -> Result<ExportStats, ExportError> {
        let started = Instant::now();

        self.initial_pass(&plan.full_box)?;
        self.write_manifests(plan)?;
        for pass in &plan.passes {
            self.export_pass(pass)?;
        }

        info!(
            tiles = self.stats.tiles,
            renders = self.stats.renders,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Export complete"
        );
        Ok(self.stats)
    }

    /// Show every layer used by any slice, then do the throwaway render if
    /// the engine needs one before output is trustworthy.
    fn initial_pass(&mut self, full_box: &DBox) -> Result<(), ExportError> {
        for name in malformed_layers(&*self.session) {
            warn!(
                layer = %name,
                "Layer name is not 'name.datatype - purpose', hidden in every slice"
            );
        }
        let all = self.slices.union_slice();
        change_slice(&mut *self.session, &self.slices, &all);
        if self.session.needs_warm_up() {
            debug!("Warm-up render");
            self.view.apply(&mut *self.session);
            self.session.render(1, 1, full_box)?;
            self.stats.renders += 1;
        }
        Ok(())
    }

    fn write_manifests(&mut self, plan: &ExportPlan) -> Result<(), ExportError> {
        info!("Writing dzi manifests");
        for job in &plan.manifests {
            let path = self
                .output
                .write_atomic(&job.path, job.manifest.to_xml().as_bytes())?;
            debug!(path = %path.display(), "Wrote manifest");
            self.stats.manifests += 1;
        }
        Ok(())
    }

    fn export_pass(&mut self, pass: &SlicePass) -> Result<(), ExportError> {
        self.output.create_dir(&pass.dir)?;
        let visible = change_slice(&mut *self.session, &self.slices, &pass.slice);
        info!(
            slice = %pass.slice.name,
            level = pass.level.level,
            tiles = pass.tile_count(),
            visible_layers = visible,
            "Exporting level"
        );

        for tile in pass.tiles() {
            self.export_tile(&tile, pass.level.tile_size)?;
        }
        self.stats.passes += 1;
        Ok(())
    }

    fn export_tile(&mut self, tile: &TileJob, tile_size: u32) -> Result<(), ExportError> {
        info!(file = %tile.path.display(), "Exporting");
        let image = self.render_tile(&tile.viewport, tile_size)?;
        let png = self.options.encoder.encode(&image)?;
        self.output.write_atomic(&tile.path, &png)?;
        self.stats.tiles += 1;
        Ok(())
    }

    fn render_with(
        &mut self,
        view: ViewState,
        viewport: &DBox,
        size: u32,
    ) -> Result<RgbImage, ExportError> {
        view.apply(&mut *self.session);
        let image = self.session.render(size, size, viewport)?;
        self.stats.renders += 1;
        if image.dimensions() != (size, size) {
            return Err(TileError::UnexpectedSize {
                expected: (size, size),
                actual: image.dimensions(),
            }
            .into());
        }
        Ok(image)
    }

    /// Render one tile, opaque on white or with alpha recovered from a black
    /// and a white render.
    pub fn render_tile(&mut self, viewport: &DBox, size: u32) -> Result<TileImage, ExportError> {
        if !self.options.transparent {
            let view = self.view.with_background(WHITE);
            return Ok(TileImage::Opaque(self.render_with(view, viewport, size)?));
        }

        let black = self.render_with(self.view.with_background(BLACK), viewport, size)?;
        let white = self.render_with(self.view.with_background(WHITE), viewport, size)?;
        let mut rgba = compose_transparent(&black, &white)?;
        if self.options.unpremultiply {
            rgba = unpremultiply(&rgba);
        }
        Ok(TileImage::Transparent(rgba))
    }
}
