//! Scanline polygon rasterizer with box-filter oversampling.

use image::{Rgb, RgbImage};

use super::layout::Polygon;
use crate::geometry::DBox;

/// Supersampled drawing surface mapped onto a design viewport.
pub(crate) struct Canvas {
    width: u32,
    height: u32,
    oversampling: u32,
    viewport: DBox,
    pixels: Vec<[f32; 3]>,
}

impl Canvas {
    pub fn new(
        width: u32,
        height: u32,
        oversampling: u32,
        viewport: DBox,
        background: Rgb<u8>,
    ) -> Self {
        let sw = width * oversampling;
        let sh = height * oversampling;
        let bg = background.0.map(f32::from);
        Self {
            width,
            height,
            oversampling,
            viewport,
            pixels: vec![bg; (sw as usize) * (sh as usize)],
        }
    }

    fn sub_width(&self) -> u32 {
        self.width * self.oversampling
    }

    fn sub_height(&self) -> u32 {
        self.height * self.oversampling
    }

    /// Design x to supersampled column coordinate.
    fn to_px(&self, x: f64) -> f64 {
        (x - self.viewport.left) / self.viewport.width() * f64::from(self.sub_width())
    }

    /// Design y to supersampled row coordinate, row 0 at the viewport top.
    fn to_py(&self, y: f64) -> f64 {
        (self.viewport.top - y) / self.viewport.height() * f64::from(self.sub_height())
    }

    fn blend(&mut self, col: u32, row: u32, color: [f32; 3], alpha: f32) {
        let idx = (row * self.sub_width() + col) as usize;
        let px = &mut self.pixels[idx];
        for c in 0..3 {
            px[c] = px[c] * (1.0 - alpha) + color[c] * alpha;
        }
    }

    /// Fill a polygon with the even-odd rule, sampling at pixel centres.
    pub fn fill_polygon(&mut self, polygon: &Polygon, color: Rgb<u8>, alpha: f32) {
        if polygon.bbox.overlap_area(&self.viewport) <= 0.0 {
            return;
        }
        let color = color.0.map(f32::from);
        let points: Vec<(f64, f64)> = polygon
            .points
            .iter()
            .map(|&(x, y)| (self.to_px(x), self.to_py(y)))
            .collect();

        let sh = f64::from(self.sub_height());
        let sw = f64::from(self.sub_width());
        let row_min = (self.to_py(polygon.bbox.top) - 0.5).ceil().max(0.0);
        let row_max = (self.to_py(polygon.bbox.bottom) - 0.5).floor().min(sh - 1.0);
        if row_min > row_max {
            return;
        }

        let mut crossings: Vec<f64> = Vec::with_capacity(points.len());
        for row in row_min as u32..=row_max as u32 {
            let yc = f64::from(row) + 0.5;
            crossings.clear();
            for i in 0..points.len() {
                let (x0, y0) = points[i];
                let (x1, y1) = points[(i + 1) % points.len()];
                if (y0 <= yc) != (y1 <= yc) {
                    crossings.push(x0 + (yc - y0) * (x1 - x0) / (y1 - y0));
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));

            for span in crossings.chunks_exact(2) {
                let start = (span[0] - 0.5).ceil().max(0.0);
                let end = (span[1] - 0.5).ceil().min(sw);
                if start >= end {
                    continue;
                }
                for col in start as u32..end as u32 {
                    self.blend(col, row, color, alpha);
                }
            }
        }
    }

    /// Draw a one-subpixel vertical line at design x.
    pub fn vertical_line(&mut self, x: f64, color: Rgb<u8>) {
        let col = self.to_px(x).floor();
        if col < 0.0 || col >= f64::from(self.sub_width()) {
            return;
        }
        let color = color.0.map(f32::from);
        for row in 0..self.sub_height() {
            self.blend(col as u32, row, color, 1.0);
        }
    }

    /// Draw a one-subpixel horizontal line at design y.
    pub fn horizontal_line(&mut self, y: f64, color: Rgb<u8>) {
        let row = self.to_py(y).floor();
        if row < 0.0 || row >= f64::from(self.sub_height()) {
            return;
        }
        let color = color.0.map(f32::from);
        for col in 0..self.sub_width() {
            self.blend(col, row as u32, color, 1.0);
        }
    }

    /// Small cross centred on a design point.
    pub fn marker(&mut self, x: f64, y: f64, color: Rgb<u8>) {
        let cx = self.to_px(x).floor() as i64;
        let cy = self.to_py(y).floor() as i64;
        let arm = i64::from(2 * self.oversampling);
        let color = color.0.map(f32::from);
        let (sw, sh) = (i64::from(self.sub_width()), i64::from(self.sub_height()));
        for d in -arm..=arm {
            for (px, py) in [(cx + d, cy), (cx, cy + d)] {
                if (0..sw).contains(&px) && (0..sh).contains(&py) {
                    self.blend(px as u32, py as u32, color, 1.0);
                }
            }
        }
    }

    /// Supersampled pixels per design unit along x.
    pub fn scale(&self) -> f64 {
        f64::from(self.sub_width()) / self.viewport.width()
    }

    pub fn viewport(&self) -> &DBox {
        &self.viewport
    }

    /// Average each `oversampling × oversampling` block into one pixel.
    pub fn finish(self) -> RgbImage {
        let os = self.oversampling;
        let sw = self.sub_width();
        let samples = (os * os) as f32;
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let mut sum = [0.0f32; 3];
            for sy in 0..os {
                for sx in 0..os {
                    let idx = ((y * os + sy) * sw + (x * os + sx)) as usize;
                    let px = self.pixels[idx];
                    for c in 0..3 {
                        sum[c] += px[c];
                    }
                }
            }
            Rgb(sum.map(|s| (s / samples).round().clamp(0.0, 255.0) as u8))
        })
    }
}
