//! Alpha recovery from two opaque renders.
//!
//! An opaque renderer cannot report coverage, but rendering the same tile
//! over black (B) and over white (W) reveals it: where geometry fully covers
//! a pixel both renders agree, where nothing covers it they differ by the
//! full range. The mask is `(255 - luma(W)) + luma(B)`, saturating.
//!
//! The result is exact for fully covered and fully empty pixels. Antialiased
//! edges get an approximation since the renderer's coverage weights are not
//! exposed.

use image::{imageops, GrayImage, Luma, Rgba, RgbImage, RgbaImage};

use crate::error::TileError;

/// Per-pixel alpha recovered from a black-background and a white-background
/// render of the same viewport.
pub fn recover_alpha(black: &RgbImage, white: &RgbImage) -> Result<GrayImage, TileError> {
    if black.dimensions() != white.dimensions() {
        return Err(TileError::SizeMismatch {
            black: black.dimensions(),
            white: white.dimensions(),
        });
    }

    let luma_b = imageops::grayscale(black);
    let luma_w = imageops::grayscale(white);

    Ok(GrayImage::from_fn(black.width(), black.height(), |x, y| {
        let w = luma_w.get_pixel(x, y).0[0];
        let b = luma_b.get_pixel(x, y).0[0];
        Luma([(u8::MAX - w).saturating_add(b)])
    }))
}

/// Combine the black render's color with the recovered alpha.
pub fn compose_transparent(black: &RgbImage, white: &RgbImage) -> Result<RgbaImage, TileError> {
    let alpha = recover_alpha(black, white)?;
    Ok(RgbaImage::from_fn(black.width(), black.height(), |x, y| {
        let [r, g, b] = black.get_pixel(x, y).0;
        Rgba([r, g, b, alpha.get_pixel(x, y).0[0]])
    }))
}

/// Undo premultiplication by alpha on an RGBA image.
///
/// The black render is the foreground color already multiplied by its
/// coverage; dividing by alpha restores the full-strength color at edges.
/// Fully transparent pixels become transparent black.
pub fn unpremultiply(image: &RgbaImage) -> RgbaImage {
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        if a == 0 {
            return Rgba([0, 0, 0, 0]);
        }
        let scale = |c: u8| {
            let v = (u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a);
            v.min(255) as u8
        };
        Rgba([scale(r), scale(g), scale(b), a])
    })
}
