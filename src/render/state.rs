use image::Rgb;

use super::RenderSession;

pub const WHITE: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);
pub const BLACK: Rgb<u8> = Rgb([0x00, 0x00, 0x00]);

/// Non-geometry decorations an engine may draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Overlays {
    pub grid: bool,
    pub text: bool,
}

/// Engine display settings owned by the export driver.
///
/// The driver applies a `ViewState` right before every render that depends
/// on it instead of relying on whatever the session was last left with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub background: Rgb<u8>,
    pub overlays: Overlays,
}

impl ViewState {
    /// Opaque white background, no grid, no text.
    pub fn export() -> Self {
        Self {
            background: WHITE,
            overlays: Overlays::default(),
        }
    }

    pub fn with_background(self, background: Rgb<u8>) -> Self {
        Self { background, ..self }
    }

    pub fn apply<S: RenderSession + ?Sized>(&self, session: &mut S) {
        session.set_background(self.background);
        session.set_overlays(self.overlays);
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::export()
    }
}
