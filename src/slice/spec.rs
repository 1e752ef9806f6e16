//! Slice definitions and the shared visibility rule.

use serde::{Deserialize, Serialize};

use super::identity::MaskLayerIdentity;
use crate::error::ConfigError;

/// Datatypes that take part in any slice.
pub const DEFAULT_DATATYPES: &[&str] = &["drawing", "res", "cut", "gate", "short", "pin"];

/// How a slice selects its mask layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SliceSpec {
    /// Exactly the listed layer names.
    ExplicitLayerSet { layers: Vec<String> },

    /// Every layer in the stack-up order up to and including `up_to`.
    CumulativeThreshold { up_to: String },
}

/// A named stage of the stack-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceDefinition {
    pub name: String,
    #[serde(flatten)]
    pub spec: SliceSpec,
}

impl SliceDefinition {
    pub fn explicit(name: impl Into<String>, layers: &[&str]) -> Self {
        Self {
            name: name.into(),
            spec: SliceSpec::ExplicitLayerSet {
                layers: layers.iter().map(|l| l.to_string()).collect(),
            },
        }
    }

    pub fn cumulative(name: impl Into<String>, up_to: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spec: SliceSpec::CumulativeThreshold {
                up_to: up_to.into(),
            },
        }
    }
}

/// Everything needed to decide layer visibility: the slices in stack order,
/// the total layer ordering for cumulative slices and the datatype whitelist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceSet {
    slices: Vec<SliceDefinition>,
    layer_order: Vec<String>,
    datatypes: Vec<String>,
}

impl SliceSet {
    /// Build a slice set, checking that slice names are unique and usable as
    /// file names and that every cumulative threshold is in `layer_order`.
    pub fn new(
        slices: Vec<SliceDefinition>,
        layer_order: Vec<String>,
        datatypes: Vec<String>,
    ) -> Result<Self, ConfigError> {
        if slices.is_empty() {
            return Err(ConfigError::Invalid("at least one slice is required".to_string()));
        }

        for (i, slice) in slices.iter().enumerate() {
            if slice.name.is_empty()
                || slice.name.contains(['/', '\\'])
                || slice.name == "."
                || slice.name == ".."
            {
                return Err(ConfigError::Invalid(format!(
                    "slice name '{}' cannot be used as a file name",
                    slice.name
                )));
            }
            if slices[..i].iter().any(|s| s.name == slice.name) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate slice name '{}'",
                    slice.name
                )));
            }
            if let SliceSpec::CumulativeThreshold { up_to } = &slice.spec {
                if !layer_order.contains(up_to) {
                    return Err(ConfigError::UnknownThresholdLayer {
                        slice: slice.name.clone(),
                        layer: up_to.clone(),
                    });
                }
            }
        }

        Ok(Self {
            slices,
            layer_order,
            datatypes,
        })
    }

    pub fn slices(&self) -> &[SliceDefinition] {
        &self.slices
    }

    pub fn get(&self, name: &str) -> Option<&SliceDefinition> {
        self.slices.iter().find(|s| s.name == name)
    }

    /// Keep only the named slices, preserving stack order.
    pub fn retain_named(&mut self, names: &[String]) -> Result<(), ConfigError> {
        if let Some(unknown) = names.iter().find(|n| self.get(n).is_none()) {
            return Err(ConfigError::UnknownSlice(unknown.clone()));
        }
        self.slices.retain(|s| names.contains(&s.name));
        Ok(())
    }

    /// A slice showing every layer any configured slice shows.
    ///
    /// Used for the initial visibility pass before the first render.
    pub fn union_slice(&self) -> SliceDefinition {
        let mut layers: Vec<String> = Vec::new();
        for slice in &self.slices {
            let names: Vec<&String> = match &slice.spec {
                SliceSpec::ExplicitLayerSet { layers } => layers.iter().collect(),
                SliceSpec::CumulativeThreshold { up_to } => {
                    let end = self.position(up_to).map_or(0, |p| p + 1);
                    self.layer_order[..end].iter().collect()
                }
            };
            for name in names {
                if !layers.contains(name) {
                    layers.push(name.clone());
                }
            }
        }
        SliceDefinition {
            name: "all".to_string(),
            spec: SliceSpec::ExplicitLayerSet { layers },
        }
    }

    fn position(&self, layer: &str) -> Option<usize> {
        self.layer_order.iter().position(|l| l == layer)
    }

    /// Whether a parsed mask layer is shown when rendering `slice`.
    pub fn is_visible(&self, layer: &MaskLayerIdentity, slice: &SliceDefinition) -> bool {
        if !self.datatypes.iter().any(|d| *d == layer.datatype) {
            return false;
        }
        match &slice.spec {
            SliceSpec::ExplicitLayerSet { layers } => layers.iter().any(|l| *l == layer.name),
            SliceSpec::CumulativeThreshold { up_to } => {
                match (self.position(&layer.name), self.position(up_to)) {
                    (Some(pos), Some(threshold)) => pos <= threshold,
                    _ => false,
                }
            }
        }
    }

    /// Visibility of a raw display name; malformed names are never visible.
    pub fn is_name_visible(&self, display_name: &str, slice: &SliceDefinition) -> bool {
        MaskLayerIdentity::parse(display_name).is_some_and(|id| self.is_visible(&id, slice))
    }
}
