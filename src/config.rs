//! Configuration management for layout-tiler.
//!
//! Settings come from three places, later ones overriding earlier ones:
//! - Compiled-in defaults (the Caravel/sky130 stack-up)
//! - A TOML project file (`--config`)
//! - Command-line arguments and `LAYOUT_TILER_*` environment variables
//!
//! # Project File
//!
//! ```toml
//! style_sheet = "sky130+micross.toml"
//! layouts = ["caravel.json", "caravel_bump_bond.json"]
//! output_dir = "tiles"
//! tile_size_exp = 9
//! zoom_depth = 12
//! transparent = true
//!
//! [[slice]]
//! name = "feol1"
//! layers = ["psdm", "nsdm", "poly", "licon1"]
//!
//! [[slice]]
//! name = "beol3"
//! up_to = "via3"
//! ```
//!
//! Relative paths in a project file are resolved against the file's directory.

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::pyramid::PyramidShape;
use crate::render::DEFAULT_OVERSAMPLING;
use crate::slice::presets::{default_datatypes, sky130_layer_order, sky130_slices};
use crate::slice::{SliceDefinition, SliceSet};

// =============================================================================
// Default Values
// =============================================================================

/// Default tile edge exponent (512 pixel tiles).
pub const DEFAULT_TILE_SIZE_EXP: u32 = 9;

/// Default number of zoom levels above level 0 (4096 pixel image).
pub const DEFAULT_ZOOM_DEPTH: u32 = 12;

/// Default layer style sheet.
pub const DEFAULT_STYLE_SHEET: &str = "sky130+micross.toml";

/// Default primary layout.
pub const DEFAULT_LAYOUT: &str = "caravel.json";

/// Default bump-bond overlay layout.
pub const DEFAULT_BUMP_BOND_LAYOUT: &str = "caravel_bump_bond.json";

/// Largest accepted tile edge exponent.
pub const MAX_TILE_SIZE_EXP: u32 = 13;

/// Largest accepted zoom depth.
pub const MAX_ZOOM_DEPTH: u32 = 24;

/// Largest accepted oversampling factor.
pub const MAX_OVERSAMPLING: u32 = 8;

// =============================================================================
// Project File
// =============================================================================

/// Everything an export needs, after merging defaults, file and CLI.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Layer style sheet.
    pub style_sheet: PathBuf,

    /// Geometry files merged into one view, primary layout first.
    pub layouts: Vec<PathBuf>,

    /// Directory receiving manifests and tile trees.
    pub output_dir: PathBuf,

    /// Tiles are `2^tile_size_exp` pixels square.
    pub tile_size_exp: u32,

    /// Full image is `2^zoom_depth` pixels square.
    pub zoom_depth: u32,

    /// Recover transparency from black and white renders instead of
    /// exporting opaque tiles on white.
    pub transparent: bool,

    /// Divide recovered colors by alpha in transparent mode.
    pub unpremultiply: bool,

    /// Renderer subsamples per pixel along each axis.
    pub oversampling: u32,

    /// Datatypes that participate in slices.
    pub datatypes: Vec<String>,

    /// Stack-up order used by cumulative slices, bottom first.
    pub layer_order: Vec<String>,

    /// Slices in stack order.
    #[serde(rename = "slice")]
    pub slices: Vec<SliceDefinition>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            style_sheet: PathBuf::from(DEFAULT_STYLE_SHEET),
            layouts: vec![
                PathBuf::from(DEFAULT_LAYOUT),
                PathBuf::from(DEFAULT_BUMP_BOND_LAYOUT),
            ],
            output_dir: PathBuf::from("."),
            tile_size_exp: DEFAULT_TILE_SIZE_EXP,
            zoom_depth: DEFAULT_ZOOM_DEPTH,
            transparent: true,
            unpremultiply: false,
            oversampling: DEFAULT_OVERSAMPLING,
            datatypes: default_datatypes(),
            layer_order: sky130_layer_order(),
            slices: sky130_slices(),
        }
    }
}

impl ProjectConfig {
    /// Read a project file, resolving relative paths against its directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&text, path)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Parse project file text; `path` is only used in error messages.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.style_sheet);
        resolve(&mut self.output_dir);
        self.layouts.iter_mut().for_each(resolve);
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layouts.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one layout file is required".to_string(),
            ));
        }
        if self.tile_size_exp > MAX_TILE_SIZE_EXP {
            return Err(ConfigError::Invalid(format!(
                "tile_size_exp must be at most {MAX_TILE_SIZE_EXP}"
            )));
        }
        if self.zoom_depth > MAX_ZOOM_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "zoom_depth must be at most {MAX_ZOOM_DEPTH}"
            )));
        }
        if self.oversampling == 0 || self.oversampling > MAX_OVERSAMPLING {
            return Err(ConfigError::Invalid(format!(
                "oversampling must be between 1 and {MAX_OVERSAMPLING}"
            )));
        }
        if self.datatypes.is_empty() {
            return Err(ConfigError::Invalid(
                "datatypes must list at least one datatype".to_string(),
            ));
        }
        self.slice_set().map(|_| ())
    }

    pub fn shape(&self) -> PyramidShape {
        PyramidShape::new(self.tile_size_exp, self.zoom_depth)
    }

    pub fn slice_set(&self) -> Result<SliceSet, ConfigError> {
        SliceSet::new(
            self.slices.clone(),
            self.layer_order.clone(),
            self.datatypes.clone(),
        )
    }
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// layout-tiler - Deep Zoom tile pyramids from chip layouts.
///
/// Renders every fabrication slice of a layout into its own DZI pyramid.
#[derive(Parser, Debug, Clone)]
#[command(name = "layout-tiler")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render all manifests and tiles.
    Export(ExportArgs),

    /// Print the export plan as JSON without rendering.
    Plan(PlanArgs),

    /// Report layers, slice membership and existing output.
    Check(CheckArgs),
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// TOML project file.
    #[arg(short, long, env = "LAYOUT_TILER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Layer style sheet, overrides the project file.
    #[arg(long, env = "LAYOUT_TILER_STYLE_SHEET")]
    pub style_sheet: Option<PathBuf>,

    /// Geometry file; repeat for overlays. Overrides the project file.
    #[arg(long = "layout", env = "LAYOUT_TILER_LAYOUTS", value_delimiter = ',')]
    pub layouts: Vec<PathBuf>,

    /// Output directory.
    #[arg(short, long, env = "LAYOUT_TILER_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Tile edge exponent (tiles are 2^N pixels).
    #[arg(long, env = "LAYOUT_TILER_TILE_SIZE_EXP")]
    pub tile_size_exp: Option<u32>,

    /// Zoom depth (full image is 2^N pixels).
    #[arg(long, env = "LAYOUT_TILER_ZOOM_DEPTH")]
    pub zoom_depth: Option<u32>,

    /// Only process these slices (comma-separated).
    #[arg(long = "slice", value_delimiter = ',')]
    pub slices: Vec<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl ProjectArgs {
    /// Load the project file (or defaults) and apply command-line overrides.
    pub fn project(&self) -> Result<ProjectConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ProjectConfig::load(path)?,
            None => ProjectConfig::default(),
        };

        if let Some(ref style_sheet) = self.style_sheet {
            config.style_sheet = style_sheet.clone();
        }
        if !self.layouts.is_empty() {
            config.layouts = self.layouts.clone();
        }
        if let Some(ref output_dir) = self.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(exp) = self.tile_size_exp {
            config.tile_size_exp = exp;
        }
        if let Some(depth) = self.zoom_depth {
            config.zoom_depth = depth;
        }

        config.validate()?;
        Ok(config)
    }

    /// Slices of `config`, narrowed to `--slice` when given.
    pub fn slice_set(&self, config: &ProjectConfig) -> Result<SliceSet, ConfigError> {
        let mut slices = config.slice_set()?;
        if !self.slices.is_empty() {
            slices.retain_named(&self.slices)?;
        }
        Ok(slices)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Export tiles with recovered transparency.
    #[arg(long, overrides_with = "opaque")]
    pub transparent: bool,

    /// Export opaque tiles on white.
    #[arg(long, overrides_with = "transparent")]
    pub opaque: bool,

    /// Levels to export, e.g. `12` or `10..=12`. Manifests are always written.
    #[arg(long, value_parser = parse_levels)]
    pub levels: Option<RangeInclusive<u32>>,

    /// Renderer subsamples per pixel along each axis.
    #[arg(long, env = "LAYOUT_TILER_OVERSAMPLING")]
    pub oversampling: Option<u32>,

    /// Favor PNG encoding speed over size.
    #[arg(long, default_value_t = false)]
    pub fast_png: bool,
}

impl ExportArgs {
    pub fn project(&self) -> Result<ProjectConfig, ConfigError> {
        let mut config = self.project.project()?;
        if self.transparent {
            config.transparent = true;
        }
        if self.opaque {
            config.transparent = false;
        }
        if let Some(oversampling) = self.oversampling {
            config.oversampling = oversampling;
            config.validate()?;
        }
        Ok(config)
    }

    /// Requested levels, defaulting to the whole pyramid.
    pub fn levels(&self, config: &ProjectConfig) -> Result<RangeInclusive<u32>, ConfigError> {
        resolve_levels(self.levels.clone(), config.zoom_depth)
    }
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Levels to plan, e.g. `12` or `10..=12`.
    #[arg(long, value_parser = parse_levels)]
    pub levels: Option<RangeInclusive<u32>>,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

/// Parse `N`, `A..=B` or `A-B` into an inclusive level range.
pub fn parse_levels(s: &str) -> Result<RangeInclusive<u32>, String> {
    let s = s.trim();
    let (start, end) = if let Some((a, b)) = s.split_once("..=") {
        (a, b)
    } else if let Some((a, b)) = s.split_once('-') {
        (a, b)
    } else {
        (s, s)
    };
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid level '{v}' in '{s}'"))
    };
    let (start, end) = (parse(start)?, parse(end)?);
    if start > end {
        return Err(format!("level range '{s}' is empty"));
    }
    Ok(start..=end)
}

/// Clamp a requested level range to the pyramid.
pub fn resolve_levels(
    levels: Option<RangeInclusive<u32>>,
    zoom_depth: u32,
) -> Result<RangeInclusive<u32>, ConfigError> {
    match levels {
        None => Ok(0..=zoom_depth),
        Some(range) if *range.start() > zoom_depth => Err(ConfigError::Invalid(format!(
            "levels start at {} but zoom_depth is {zoom_depth}",
            range.start()
        ))),
        Some(range) => Ok(*range.start()..=(*range.end()).min(zoom_depth)),
    }
}

// =============================================================================
// Tests
// =============================================================================
