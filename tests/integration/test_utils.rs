//! Test utilities for integration tests.
//!
//! This module provides a recording mock render session and helpers for
//! writing small style sheets, layouts and project files to disk.

use image::{Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

use layout_tiler::error::EngineError;
use layout_tiler::geometry::DBox;
use layout_tiler::render::{LayerInfo, Overlays, RenderSession};
use layout_tiler::slice::{SliceDefinition, SliceSet};

// =============================================================================
// Recording Mock Session
// =============================================================================

/// Color the mock paints over the whole viewport when any layer is shown.
pub const INK: Rgb<u8> = Rgb([200, 40, 10]);

/// State of the mock at the moment of one render call.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRecord {
    pub width: u32,
    pub height: u32,
    pub viewport: DBox,
    pub background: Rgb<u8>,
    pub overlays: Overlays,
    /// Names of layers drawn, as of the last refresh
    pub drawn: Vec<String>,
}

/// Every call made on the mock, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    LoadStyleSheet,
    LoadLayout,
    ExpandHierarchy,
    SetVisible(usize, bool),
    Refresh,
    Background(Rgb<u8>),
    Overlays(Overlays),
    Render(RenderRecord),
}

/// A render session that records every call.
///
/// Like a real engine, visibility only reaches rendered output after
/// `refresh`. Renders are solid [`INK`] when any layer is drawn and solid
/// background otherwise. With `warm_up` set, the first render ignores the
/// layers entirely, the way some engines return stale content.
pub struct RecordingSession {
    names: Vec<String>,
    visible: Vec<bool>,
    drawn: Vec<String>,
    background: Rgb<u8>,
    overlays: Overlays,
    full_box: DBox,
    warm_up: bool,
    renders: usize,
    pub calls: Vec<Call>,
}

impl RecordingSession {
    pub fn new(names: &[&str], full_box: DBox) -> Self {
        Self {
            names: names.iter().map(|s| s.to_string()).collect(),
            visible: vec![true; names.len()],
            drawn: Vec::new(),
            background: Rgb([0x12, 0x34, 0x56]),
            overlays: Overlays {
                grid: true,
                text: true,
            },
            full_box,
            warm_up: false,
            renders: 0,
            calls: Vec::new(),
        }
    }

    pub fn with_warm_up(mut self) -> Self {
        self.warm_up = true;
        self
    }

    pub fn renders(&self) -> Vec<&RenderRecord> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Render(r) => Some(r),
                _ => None,
            })
            .collect()
    }
}

impl RenderSession for RecordingSession {
    fn load_style_sheet(&mut self, _path: &Path) -> Result<(), EngineError> {
        self.calls.push(Call::LoadStyleSheet);
        Ok(())
    }

    fn load_layout(&mut self, _path: &Path) -> Result<(), EngineError> {
        self.calls.push(Call::LoadLayout);
        Ok(())
    }

    fn expand_hierarchy(&mut self) {
        self.calls.push(Call::ExpandHierarchy);
    }

    fn bounding_box(&self) -> Result<DBox, EngineError> {
        Ok(self.full_box)
    }

    fn layers(&self) -> Vec<LayerInfo> {
        self.names
            .iter()
            .zip(&self.visible)
            .map(|(name, &visible)| LayerInfo {
                name: name.clone(),
                visible,
            })
            .collect()
    }

    fn set_layer_visible(&mut self, index: usize, visible: bool) {
        self.calls.push(Call::SetVisible(index, visible));
        self.visible[index] = visible;
    }

    fn refresh(&mut self) {
        self.calls.push(Call::Refresh);
        self.drawn = self
            .names
            .iter()
            .zip(&self.visible)
            .filter(|(_, &v)| v)
            .map(|(n, _)| n.clone())
            .collect();
    }

    fn set_background(&mut self, color: Rgb<u8>) {
        self.calls.push(Call::Background(color));
        self.background = color;
    }

    fn set_overlays(&mut self, overlays: Overlays) {
        self.calls.push(Call::Overlays(overlays));
        self.overlays = overlays;
    }

    fn render(
        &mut self,
        width: u32,
        height: u32,
        viewport: &DBox,
    ) -> Result<RgbImage, EngineError> {
        self.calls.push(Call::Render(RenderRecord {
            width,
            height,
            viewport: *viewport,
            background: self.background,
            overlays: self.overlays,
            drawn: self.drawn.clone(),
        }));
        self.renders += 1;

        let stale = self.warm_up && self.renders == 1;
        let color = if self.drawn.is_empty() || stale {
            self.background
        } else {
            INK
        };
        Ok(RgbImage::from_pixel(width, height, color))
    }

    fn needs_warm_up(&self) -> bool {
        self.warm_up
    }
}

// =============================================================================
// Slice Helpers
// =============================================================================

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Two explicit slices over a three-layer stack plus one that matches nothing.
pub fn small_slices() -> SliceSet {
    SliceSet::new(
        vec![
            SliceDefinition::explicit("feol", &["poly"]),
            SliceDefinition::explicit("metal", &["met1"]),
            SliceDefinition::explicit("empty", &["met9"]),
        ],
        strings(&["poly", "met1", "met5"]),
        strings(&["drawing"]),
    )
    .unwrap()
}

// =============================================================================
// Design Files
// =============================================================================

/// Style sheet for [`LAYOUT_JSON`]. Layer 99/0 is deliberately unstyled.
pub const STYLE_TOML: &str = r##"
[[layer]]
source = "66/20"
name = "poly.drawing - 66/20"
fill = "#ff0000"

[[layer]]
source = "68/20"
name = "met1.drawing - 68/20"
fill = "#0000ff"
"##;

/// A 100x100 design: poly on the left half, met1 on the right half through
/// a cell instance, and a small unstyled marker in the top right corner.
pub const LAYOUT_JSON: &str = r#"{
    "top": "chip",
    "cells": {
        "chip": {
            "shapes": [
                { "layer": 66, "datatype": 20, "rect": [0, 0, 50, 100] },
                { "layer": 99, "datatype": 0, "rect": [90, 90, 100, 100] }
            ],
            "instances": [{ "cell": "wire", "dx": 50, "dy": 0 }]
        },
        "wire": {
            "shapes": [{ "layer": 68, "datatype": 20, "rect": [0, 0, 50, 100] }]
        }
    }
}"#;

/// Design files written to a temporary directory.
pub struct DesignFixture {
    pub dir: tempfile::TempDir,
    pub style_sheet: PathBuf,
    pub layout: PathBuf,
}

impl DesignFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let style_sheet = dir.path().join("style.toml");
        let layout = dir.path().join("chip.json");
        fs::write(&style_sheet, STYLE_TOML).unwrap();
        fs::write(&layout, LAYOUT_JSON).unwrap();
        Self {
            dir,
            style_sheet,
            layout,
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    /// Write a project file referencing the fixture by relative paths.
    pub fn write_project(&self, extra: &str) -> PathBuf {
        let path = self.dir.path().join("project.toml");
        let text = format!(
            "style_sheet = \"style.toml\"\n\
             layouts = [\"chip.json\"]\n\
             output_dir = \"out\"\n\
             tile_size_exp = 2\n\
             zoom_depth = 3\n\
             layer_order = [\"poly\", \"met1\", \"met5\"]\n\
             datatypes = [\"drawing\"]\n\
             {extra}\n\
             [[slice]]\n\
             name = \"feol\"\n\
             layers = [\"poly\"]\n\
             \n\
             [[slice]]\n\
             name = \"metal\"\n\
             up_to = \"met1\"\n"
        );
        fs::write(&path, text).unwrap();
        path
    }
}

/// Decode a written PNG tile.
pub fn read_tile(path: &Path) -> image::RgbaImage {
    image::open(path)
        .unwrap_or_else(|e| panic!("cannot decode {}: {e}", path.display()))
        .to_rgba8()
}
