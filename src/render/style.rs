//! Layer style sheets.
//!
//! A style sheet is a TOML file listing layers in drawing order:
//!
//! ```toml
//! [[layer]]
//! source = "68/20"
//! name = "met1.drawing - 68/20"
//! fill = "#0000ff"
//! opacity = 0.6
//! ```
//!
//! `name` defaults to the source pair, `opacity` to 1.0.

use image::Rgb;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::error::EngineError;

/// GDS layer/datatype number pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub struct LayerKey {
    pub layer: u16,
    pub datatype: u16,
}

impl LayerKey {
    pub fn new(layer: u16, datatype: u16) -> Self {
        Self { layer, datatype }
    }

    /// Parse `"68/20"`.
    pub fn parse(s: &str) -> Option<Self> {
        let (layer, datatype) = s.trim().split_once('/')?;
        Some(Self {
            layer: layer.trim().parse().ok()?,
            datatype: datatype.trim().parse().ok()?,
        })
    }
}

impl fmt::Display for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.layer, self.datatype)
    }
}

/// Parse `#rrggbb` (the leading `#` is optional).
pub fn parse_hex_color(s: &str) -> Option<Rgb<u8>> {
    let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

/// Resolved style of one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerStyle {
    pub source: LayerKey,
    pub name: String,
    pub fill: Rgb<u8>,
    pub opacity: f32,
}

#[derive(Deserialize)]
struct StyleSheetFile {
    #[serde(rename = "layer", default)]
    layers: Vec<StyleEntry>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StyleEntry {
    source: String,
    name: Option<String>,
    fill: String,
    #[serde(default = "default_opacity")]
    opacity: f32,
}

fn default_opacity() -> f32 {
    1.0
}

/// Ordered layer styles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleSheet {
    layers: Vec<LayerStyle>,
}

impl StyleSheet {
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parse style sheet text; `path` is only used in error messages.
    pub fn parse(text: &str, path: &Path) -> Result<Self, EngineError> {
        let invalid = |message: String| EngineError::StyleSheet {
            path: path.to_path_buf(),
            message,
        };

        let file: StyleSheetFile = toml::from_str(text).map_err(|e| invalid(e.to_string()))?;

        let mut layers: Vec<LayerStyle> = Vec::with_capacity(file.layers.len());
        for entry in file.layers {
            let source = LayerKey::parse(&entry.source)
                .ok_or_else(|| invalid(format!("bad source '{}'", entry.source)))?;
            if layers.iter().any(|l| l.source == source) {
                return Err(invalid(format!("duplicate source '{source}'")));
            }
            let fill = parse_hex_color(&entry.fill)
                .ok_or_else(|| invalid(format!("bad fill color '{}'", entry.fill)))?;
            if !(0.0..=1.0).contains(&entry.opacity) {
                return Err(invalid(format!(
                    "opacity {} of '{source}' outside 0..1",
                    entry.opacity
                )));
            }
            layers.push(LayerStyle {
                source,
                name: entry.name.unwrap_or_else(|| source.to_string()),
                fill,
                opacity: entry.opacity,
            });
        }

        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[LayerStyle] {
        &self.layers
    }

    /// Drawing position and style for a layer/datatype pair.
    pub fn find(&self, key: LayerKey) -> Option<(usize, &LayerStyle)> {
        self.layers.iter().enumerate().find(|(_, l)| l.source == key)
    }
}
