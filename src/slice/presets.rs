//! Built-in stack-up for the Caravel harness on sky130 with the bump-bond
//! redistribution layers on top.

use super::spec::{SliceDefinition, DEFAULT_DATATYPES};

/// sky130 mask layers ordered bottom to top, bump-bond layers last.
pub const SKY130_LAYER_ORDER: &[&str] = &[
    "psdm", "nsdm", "poly", "licon1", "li1", "mcon", "met1", "via", "met2", "via2", "met3",
    "via3", "met4", "via4", "met5", "pad", "pi1", "rdl", "pi2",
];

/// Process-stage slices, each listing the layers it adds.
pub fn sky130_slices() -> Vec<SliceDefinition> {
    vec![
        SliceDefinition::explicit("feol1", &["psdm", "nsdm", "poly", "licon1"]),
        SliceDefinition::explicit("feol2", &["li1", "mcon"]),
        SliceDefinition::explicit("beol1", &["met1", "via"]),
        SliceDefinition::explicit("beol2", &["met2", "via2"]),
        SliceDefinition::explicit("beol3", &["met3", "via3"]),
        SliceDefinition::explicit("beol4", &["met4", "via4"]),
        SliceDefinition::explicit("beol5", &["met5", "pad"]),
        SliceDefinition::explicit("bump", &["pi1", "rdl", "pi2"]),
    ]
}

/// The same stages as cumulative views: each slice shows everything below it.
pub fn sky130_cumulative_slices() -> Vec<SliceDefinition> {
    [
        ("feol1", "licon1"),
        ("feol2", "mcon"),
        ("beol1", "via"),
        ("beol2", "via2"),
        ("beol3", "via3"),
        ("beol4", "via4"),
        ("beol5", "pad"),
        ("bump", "pi2"),
    ]
    .into_iter()
    .map(|(name, up_to)| SliceDefinition::cumulative(name, up_to))
    .collect()
}

pub fn sky130_layer_order() -> Vec<String> {
    SKY130_LAYER_ORDER.iter().map(|s| s.to_string()).collect()
}

pub fn default_datatypes() -> Vec<String> {
    DEFAULT_DATATYPES.iter().map(|s| s.to_string()).collect()
}
