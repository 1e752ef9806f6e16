//! Built-in rendering engine for TOML style sheets and JSON geometry.

use image::{Rgb, RgbImage};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use super::layout::{LayerGeometry, LayoutFile};
use super::raster::Canvas;
use super::state::Overlays;
use super::style::{LayerKey, StyleSheet};
use super::{LayerInfo, RenderSession};
use crate::error::EngineError;
use crate::geometry::DBox;

/// Subsamples per pixel along each axis.
pub const DEFAULT_OVERSAMPLING: u32 = 3;

/// Grid spacing in design units when the grid overlay is on.
pub const DEFAULT_GRID_PITCH: f64 = 100.0;

/// Largest supersampled edge the engine will allocate.
const MAX_RENDER_EDGE: u32 = 1 << 15;

const UNSTYLED_FILL: Rgb<u8> = Rgb([0x80, 0x80, 0x80]);
const GRID_COLOR: Rgb<u8> = Rgb([0x80, 0x80, 0x80]);

#[derive(Debug, Clone)]
struct EngineLayer {
    key: LayerKey,
    name: String,
    fill: Rgb<u8>,
    opacity: f32,
    visible: bool,
}

/// Software rendering session.
///
/// Visibility changes are recorded immediately but only reach rendered
/// output after [`RenderSession::refresh`].
#[derive(Debug)]
pub struct VectorEngine {
    style: StyleSheet,
    layouts: Vec<LayoutFile>,
    layers: Vec<EngineLayer>,
    geometry: BTreeMap<LayerKey, LayerGeometry>,
    expanded: bool,
    background: Rgb<u8>,
    overlays: Overlays,
    oversampling: u32,
    grid_pitch: f64,
    /// Indices into `layers` drawn by `render`, fixed at the last refresh.
    draw_list: Vec<usize>,
}

impl VectorEngine {
    pub fn new() -> Self {
        Self::with_oversampling(DEFAULT_OVERSAMPLING)
    }

    pub fn with_oversampling(oversampling: u32) -> Self {
        Self {
            style: StyleSheet::default(),
            layouts: Vec::new(),
            layers: Vec::new(),
            geometry: BTreeMap::new(),
            expanded: false,
            background: Rgb([0xff, 0xff, 0xff]),
            overlays: Overlays::default(),
            oversampling: oversampling.max(1),
            grid_pitch: DEFAULT_GRID_PITCH,
            draw_list: Vec::new(),
        }
    }

    pub fn with_grid_pitch(mut self, pitch: f64) -> Self {
        if pitch > 0.0 {
            self.grid_pitch = pitch;
        }
        self
    }

    /// Load a style sheet already parsed in memory.
    pub fn set_style_sheet(&mut self, style: StyleSheet) {
        self.style = style;
        self.rebuild_layers();
    }

    /// Merge an already parsed layout.
    pub fn add_layout(&mut self, layout: LayoutFile) {
        self.layouts.push(layout);
        self.rebuild_geometry();
        self.rebuild_layers();
    }

    fn rebuild_geometry(&mut self) {
        let mut geometry = BTreeMap::new();
        for layout in &self.layouts {
            layout.collect(self.expanded, &mut geometry);
        }
        self.geometry = geometry;
    }

    /// Style-sheet layers first in sheet order, then unstyled layers found
    /// in the geometry. Existing visibility flags are kept.
    fn rebuild_layers(&mut self) {
        let previous: BTreeMap<LayerKey, bool> =
            self.layers.iter().map(|l| (l.key, l.visible)).collect();
        let visible = |key: LayerKey| previous.get(&key).copied().unwrap_or(true);

        let mut layers: Vec<EngineLayer> = self
            .style
            .layers()
            .iter()
            .map(|s| EngineLayer {
                key: s.source,
                name: s.name.clone(),
                fill: s.fill,
                opacity: s.opacity,
                visible: visible(s.source),
            })
            .collect();

        let mut extra: Vec<LayerKey> = self
            .layouts
            .iter()
            .flat_map(|l| l.layer_keys())
            .filter(|k| self.style.find(*k).is_none())
            .collect();
        extra.sort();
        extra.dedup();
        layers.extend(extra.into_iter().map(|key| EngineLayer {
            key,
            name: key.to_string(),
            fill: UNSTYLED_FILL,
            opacity: 1.0,
            visible: visible(key),
        }));

        self.layers = layers;
        self.refresh();
    }

    fn draw_grid(&self, canvas: &mut Canvas) {
        let pitch = self.grid_pitch;
        // Skip when lines would be closer than a few pixels
        if pitch * canvas.scale() < f64::from(4 * self.oversampling) {
            return;
        }
        let vp = *canvas.viewport();
        let mut x = (vp.left / pitch).ceil() * pitch;
        while x < vp.right {
            canvas.vertical_line(x, GRID_COLOR);
            x += pitch;
        }
        let mut y = (vp.bottom / pitch).ceil() * pitch;
        while y < vp.top {
            canvas.horizontal_line(y, GRID_COLOR);
            y += pitch;
        }
    }
}

impl Default for VectorEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSession for VectorEngine {
    fn load_style_sheet(&mut self, path: &Path) -> Result<(), EngineError> {
        let style = StyleSheet::load(path)?;
        info!(path = %path.display(), layers = style.layers().len(), "Loaded style sheet");
        self.set_style_sheet(style);
        Ok(())
    }

    fn load_layout(&mut self, path: &Path) -> Result<(), EngineError> {
        let layout = LayoutFile::load(path)?;
        info!(path = %path.display(), "Loaded layout");
        self.add_layout(layout);
        Ok(())
    }

    fn expand_hierarchy(&mut self) {
        self.expanded = true;
        self.rebuild_geometry();
        self.refresh();
    }

    fn bounding_box(&self) -> Result<DBox, EngineError> {
        self.layouts
            .iter()
            .filter_map(|l| l.bounding_box())
            .reduce(|a, b| a.union(&b))
            .ok_or(EngineError::EmptyLayout)
    }

    fn layers(&self) -> Vec<LayerInfo> {
        self.layers
            .iter()
            .map(|l| LayerInfo {
                name: l.name.clone(),
                visible: l.visible,
            })
            .collect()
    }

    fn set_layer_visible(&mut self, index: usize, visible: bool) {
        if let Some(layer) = self.layers.get_mut(index) {
            layer.visible = visible;
        }
    }

    fn refresh(&mut self) {
        self.draw_list = self
            .layers
            .iter()
            .enumerate()
            .filter(|(_, l)| l.visible)
            .map(|(i, _)| i)
            .collect();
    }

    fn set_background(&mut self, color: Rgb<u8>) {
        self.background = color;
    }

    fn set_overlays(&mut self, overlays: Overlays) {
        self.overlays = overlays;
    }

    fn render(
        &mut self,
        width: u32,
        height: u32,
        viewport: &DBox,
    ) -> Result<RgbImage, EngineError> {
        let too_big = |edge: u32| {
            edge.checked_mul(self.oversampling).map_or(true, |e| e > MAX_RENDER_EDGE)
        };
        if width == 0 || height == 0 || too_big(width) || too_big(height) {
            return Err(EngineError::InvalidRenderSize { width, height });
        }
        if viewport.width() <= 0.0 || viewport.height() <= 0.0 {
            // A degenerate viewport shows nothing but background.
            return Ok(RgbImage::from_pixel(width, height, self.background));
        }

        let mut canvas = Canvas::new(width, height, self.oversampling, *viewport, self.background);
        for &index in &self.draw_list {
            let Some(layer) = self.layers.get(index) else {
                continue;
            };
            let Some(geometry) = self.geometry.get(&layer.key) else {
                continue;
            };
            for polygon in &geometry.polygons {
                canvas.fill_polygon(polygon, layer.fill, layer.opacity);
            }
            if self.overlays.text {
                for label in &geometry.labels {
                    canvas.marker(label.x, label.y, layer.fill);
                }
            }
        }
        if self.overlays.grid {
            self.draw_grid(&mut canvas);
        }

        debug!(width, height, layers = self.draw_list.len(), "Rendered viewport");
        Ok(canvas.finish())
    }
}
