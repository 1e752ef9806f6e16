//! Tile production.
//!
//! Turns engine renders into encoded PNG tiles, either opaque on the export
//! background or with a transparency mask recovered from two renders.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          Pyramid Export Driver          │
//! └────────────────────┬────────────────────┘
//!                      │ RgbImage (white) or
//!                      │ RgbImage (black) + RgbImage (white)
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │ Compositor   │  │  PNG Encoder    │  │
//! │  │ (alpha from  │─▶│  (RGB / RGBA)   │  │
//! │  │  B and W)    │  │                 │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`recover_alpha`] / [`compose_transparent`]: two-background alpha recovery
//! - [`PngTileEncoder`]: encodes [`TileImage`] values to PNG bytes

mod compositor;
mod encoder;

pub use compositor::{compose_transparent, recover_alpha, unpremultiply};
pub use encoder::{PngTileEncoder, TileImage};
