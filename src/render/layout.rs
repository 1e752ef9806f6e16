//! JSON geometry files for the vector engine.
//!
//! ```json
//! {
//!   "top": "chip",
//!   "cells": {
//!     "chip": {
//!       "shapes": [
//!         { "layer": 68, "datatype": 20, "rect": [0, 0, 100, 20] },
//!         { "layer": 66, "datatype": 20, "points": [[0, 0], [10, 0], [0, 10]] }
//!       ],
//!       "instances": [{ "cell": "pad", "dx": 500, "dy": 0 }],
//!       "texts": [{ "layer": 68, "datatype": 5, "text": "VDD", "x": 1, "y": 2 }]
//!     },
//!     "pad": { "shapes": [{ "layer": 76, "datatype": 20, "rect": [0, 0, 50, 50] }] }
//!   }
//! }
//! ```

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use super::style::LayerKey;
use crate::error::EngineError;
use crate::geometry::DBox;

#[derive(Debug, Deserialize)]
struct LayoutDocument {
    top: String,
    cells: BTreeMap<String, CellDocument>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CellDocument {
    shapes: Vec<ShapeDocument>,
    instances: Vec<InstanceDocument>,
    texts: Vec<TextDocument>,
}

#[derive(Debug, Deserialize)]
struct ShapeDocument {
    #[serde(flatten)]
    key: LayerKey,
    #[serde(flatten)]
    geometry: GeometryDocument,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeometryDocument {
    Rect { rect: [f64; 4] },
    Polygon { points: Vec<[f64; 2]> },
}

#[derive(Debug, Deserialize)]
struct InstanceDocument {
    cell: String,
    #[serde(default)]
    dx: f64,
    #[serde(default)]
    dy: f64,
}

#[derive(Debug, Deserialize)]
struct TextDocument {
    #[serde(flatten)]
    key: LayerKey,
    text: String,
    x: f64,
    y: f64,
}

/// Closed polygon in design coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub points: Vec<(f64, f64)>,
    pub bbox: DBox,
}

impl Polygon {
    fn new(points: Vec<(f64, f64)>) -> Option<Self> {
        if points.len() < 3 || points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return None;
        }
        let (x0, y0) = points[0];
        let bbox = points
            .iter()
            .fold(DBox::new(x0, y0, x0, y0), |b, &(x, y)| {
                b.union(&DBox::new(x, y, x, y))
            });
        Some(Self { points, bbox })
    }

    fn rect(r: [f64; 4]) -> Option<Self> {
        let b = DBox::new(r[0], r[1], r[2], r[3]);
        Self::new(vec![
            (b.left, b.bottom),
            (b.right, b.bottom),
            (b.right, b.top),
            (b.left, b.top),
        ])
    }

    fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            points: self.points.iter().map(|&(x, y)| (x + dx, y + dy)).collect(),
            bbox: self.bbox.translated(dx, dy),
        }
    }
}

/// Text label anchored at a point.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Default)]
struct Cell {
    shapes: Vec<(LayerKey, Polygon)>,
    instances: Vec<(String, f64, f64)>,
    labels: Vec<(LayerKey, Label)>,
}

/// Geometry collected per layer after flattening.
#[derive(Debug, Default, Clone)]
pub struct LayerGeometry {
    pub polygons: Vec<Polygon>,
    pub labels: Vec<Label>,
}

/// One loaded geometry file.
#[derive(Debug)]
pub struct LayoutFile {
    top: String,
    cells: BTreeMap<String, Cell>,
}

impl LayoutFile {
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parse a geometry document; `path` is only used in error messages.
    pub fn parse(text: &str, path: &Path) -> Result<Self, EngineError> {
        let invalid = |message: String| EngineError::Layout {
            path: path.to_path_buf(),
            message,
        };

        let doc: LayoutDocument =
            serde_json::from_str(text).map_err(|e| invalid(e.to_string()))?;

        let mut cells = BTreeMap::new();
        for (name, cell_doc) in doc.cells {
            let mut cell = Cell::default();
            for (i, shape) in cell_doc.shapes.into_iter().enumerate() {
                let polygon = match shape.geometry {
                    GeometryDocument::Rect { rect } => Polygon::rect(rect),
                    GeometryDocument::Polygon { points } => {
                        Polygon::new(points.into_iter().map(|[x, y]| (x, y)).collect())
                    }
                }
                .ok_or_else(|| invalid(format!("cell '{name}' shape {i} is degenerate")))?;
                cell.shapes.push((shape.key, polygon));
            }
            for inst in cell_doc.instances {
                cell.instances.push((inst.cell, inst.dx, inst.dy));
            }
            for text in cell_doc.texts {
                cell.labels.push((
                    text.key,
                    Label {
                        text: text.text,
                        x: text.x,
                        y: text.y,
                    },
                ));
            }
            cells.insert(name, cell);
        }

        let layout = Self {
            top: doc.top,
            cells,
        };
        layout.check_hierarchy().map_err(invalid)?;
        Ok(layout)
    }

    /// Top cell exists, every instance resolves and there are no cycles.
    fn check_hierarchy(&self) -> Result<(), String> {
        if !self.cells.contains_key(&self.top) {
            return Err(format!("top cell '{}' not defined", self.top));
        }
        for (name, cell) in &self.cells {
            for (target, _, _) in &cell.instances {
                if !self.cells.contains_key(target) {
                    return Err(format!("cell '{name}' instantiates unknown cell '{target}'"));
                }
            }
        }

        fn visit<'a>(
            layout: &'a LayoutFile,
            name: &'a str,
            path: &mut Vec<&'a str>,
            done: &mut HashSet<&'a str>,
        ) -> Result<(), String> {
            if done.contains(name) {
                return Ok(());
            }
            if path.contains(&name) {
                return Err(format!("cell '{name}' instantiates itself"));
            }
            path.push(name);
            if let Some(cell) = layout.cells.get(name) {
                for (target, _, _) in &cell.instances {
                    visit(layout, target, path, done)?;
                }
            }
            path.pop();
            done.insert(name);
            Ok(())
        }

        let mut done = HashSet::new();
        for name in self.cells.keys() {
            visit(self, name, &mut Vec::new(), &mut done)?;
        }
        Ok(())
    }

    /// Add this file's geometry to `out`, keyed by layer.
    ///
    /// With `expand` unset only shapes of the top cell are collected.
    pub fn collect(&self, expand: bool, out: &mut BTreeMap<LayerKey, LayerGeometry>) {
        self.collect_cell(&self.top, 0.0, 0.0, expand, out);
    }

    fn collect_cell(
        &self,
        name: &str,
        dx: f64,
        dy: f64,
        expand: bool,
        out: &mut BTreeMap<LayerKey, LayerGeometry>,
    ) {
        let Some(cell) = self.cells.get(name) else {
            return;
        };
        for (key, polygon) in &cell.shapes {
            out.entry(*key)
                .or_default()
                .polygons
                .push(polygon.translated(dx, dy));
        }
        for (key, label) in &cell.labels {
            out.entry(*key).or_default().labels.push(Label {
                text: label.text.clone(),
                x: label.x + dx,
                y: label.y + dy,
            });
        }
        if expand {
            for (target, ix, iy) in &cell.instances {
                self.collect_cell(target, dx + ix, dy + iy, expand, out);
            }
        }
    }

    /// Bounding box of the fully expanded hierarchy.
    pub fn bounding_box(&self) -> Option<DBox> {
        let mut geometry = BTreeMap::new();
        self.collect(true, &mut geometry);
        geometry
            .values()
            .flat_map(|g| g.polygons.iter().map(|p| p.bbox))
            .reduce(|a, b| a.union(&b))
    }

    /// Every layer used anywhere in the file.
    pub fn layer_keys(&self) -> Vec<LayerKey> {
        let mut keys: Vec<LayerKey> = self
            .cells
            .values()
            .flat_map(|c| {
                c.shapes
                    .iter()
                    .map(|(k, _)| *k)
                    .chain(c.labels.iter().map(|(k, _)| *k))
            })
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}
