//! Mask layer identities parsed from engine display names.

use regex::Regex;
use std::sync::OnceLock;

/// A mask layer as seen through its display name `name.datatype - purpose`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskLayerIdentity {
    /// Layer name, e.g. `met1`
    pub name: String,
    /// Datatype name, e.g. `drawing`
    pub datatype: String,
    /// Free-form purpose label, typically the GDS `layer/datatype` pair
    pub purpose: String,
}

/// Pattern for engine display names.
///
/// Groups are greedy like the layer property files produce them:
/// `met1.drawing - 68/20` gives `met1`, `drawing`, `68/20`.
fn display_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(.*)\.(.*) - (.*)").unwrap())
}

impl MaskLayerIdentity {
    /// Parse a display name, returning `None` when it does not follow the
    /// `name.datatype - purpose` convention.
    pub fn parse(display_name: &str) -> Option<Self> {
        let caps = display_name_pattern().captures(display_name)?;
        Some(Self {
            name: caps[1].to_string(),
            datatype: caps[2].to_string(),
            purpose: caps[3].to_string(),
        })
    }
}
