//! Slice visibility.
//!
//! A slice is one stage of the fabrication stack-up (front-end, a metal
//! level, the bump-bond redistribution layers). Rendering a slice means
//! showing exactly the mask layers it selects and hiding everything else.
//!
//! - [`MaskLayerIdentity`]: `name.datatype - purpose` parsed from a display name
//! - [`SliceSpec`]: explicit layer set or cumulative threshold
//! - [`SliceSet`]: slices in stack order plus the shared visibility rule
//! - [`change_slice`]: push a slice's visibility into a render session
//! - [`malformed_layers`]: layers no slice can ever show

mod identity;
pub mod presets;
mod spec;

use tracing::debug;

use crate::render::RenderSession;

pub use identity::MaskLayerIdentity;
pub use spec::{SliceDefinition, SliceSet, SliceSpec, DEFAULT_DATATYPES};

/// Set every engine layer's visibility for `slice`, then refresh the engine.
///
/// Layers whose display name does not parse are hidden. Returns the number
/// of visible layers.
pub fn change_slice<S: RenderSession + ?Sized>(
    session: &mut S,
    slices: &SliceSet,
    slice: &SliceDefinition,
) -> usize {
    let mut visible_count = 0;
    for (index, layer) in session.layers().iter().enumerate() {
        let visible = slices.is_name_visible(&layer.name, slice);
        if visible {
            visible_count += 1;
        }
        session.set_layer_visible(index, visible);
    }
    session.refresh();

    debug!(slice = %slice.name, visible = visible_count, "Applied slice visibility");
    visible_count
}

/// Display names of engine layers that are not `name.datatype - purpose`.
pub fn malformed_layers<S: RenderSession + ?Sized>(session: &S) -> Vec<String> {
    session
        .layers()
        .into_iter()
        .filter(|layer| MaskLayerIdentity::parse(&layer.name).is_none())
        .map(|layer| layer.name)
        .collect()
}
