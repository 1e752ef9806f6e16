//! Design-space boxes and the tile grid mapping.
//!
//! Coordinates are in design units with y increasing upwards. Tile rows are
//! numbered from the top, so row 0 touches [`DBox::top`].

use serde::{Deserialize, Serialize};

/// Axis-aligned box in design coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DBox {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl DBox {
    /// Create a box from its edges, normalizing swapped coordinates.
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            left: left.min(right),
            bottom: bottom.min(top),
            right: left.max(right),
            top: bottom.max(top),
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &DBox) -> DBox {
        DBox {
            left: self.left.min(other.left),
            bottom: self.bottom.min(other.bottom),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
        }
    }

    /// Box translated by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> DBox {
        DBox {
            left: self.left + dx,
            bottom: self.bottom + dy,
            right: self.right + dx,
            top: self.top + dy,
        }
    }

    /// Area shared with `other`, zero when they only touch.
    pub fn overlap_area(&self, other: &DBox) -> f64 {
        let w = self.right.min(other.right) - self.left.max(other.left);
        let h = self.top.min(other.top) - self.bottom.max(other.bottom);
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }
}

/// Interpolate between `from` and `to` at fraction `t`.
///
/// `t == 0.0` yields `from` and `t == 1.0` yields `to` exactly.
#[inline]
fn lerp(from: f64, to: f64, t: f64) -> f64 {
    to * t + from * (1.0 - t)
}

/// Map tile `(x, y)` of a `subdiv × subdiv` grid to its sub-box of `full_box`.
///
/// Neighbouring tiles evaluate the same expression for their shared edge, so
/// the grid partitions `full_box` without gaps or overlaps.
pub fn zoom(full_box: &DBox, subdiv: u32, x: u32, y: u32) -> DBox {
    debug_assert!(subdiv > 0 && x < subdiv && y < subdiv);
    let n = f64::from(subdiv);
    let x0 = f64::from(x) / n;
    let x1 = f64::from(x + 1) / n;
    let y0 = f64::from(y) / n;
    let y1 = f64::from(y + 1) / n;

    DBox {
        left: lerp(full_box.left, full_box.right, x0),
        right: lerp(full_box.left, full_box.right, x1),
        top: lerp(full_box.top, full_box.bottom, y0),
        bottom: lerp(full_box.top, full_box.bottom, y1),
    }
}
