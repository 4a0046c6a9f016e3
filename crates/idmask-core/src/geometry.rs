//! Coordinate transforms between fragment-local, device and top-left layout space.
//!
//! Device space has its origin at the bottom-left of the page. Boxes produced
//! by the locator are anchored at the baseline of the matched span; the
//! renderer re-anchors them to their top edge with [`to_top_left_rect`].

use serde::{Deserialize, Serialize};

/// A 2D affine transform `[a, b, c, d, e, f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix(pub [f64; 6]);

impl Matrix {
    /// The identity transform.
    pub const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    /// Create a matrix from its six components.
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Matrix([a, b, c, d, e, f])
    }

    /// A pure translation.
    pub fn translation(tx: f64, ty: f64) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// Compose `self` followed by `other` (`self × other`).
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a1 * a2 + b1 * c2,
            a1 * b2 + b1 * d2,
            c1 * a2 + d1 * c2,
            c1 * b2 + d1 * d2,
            e1 * a2 + f1 * c2 + e2,
            e1 * b2 + f1 * d2 + f2,
        ])
    }

    /// Length of the transformed unit x vector.
    pub fn x_scale(&self) -> f64 {
        self.0[0].hypot(self.0[1])
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::IDENTITY
    }
}

/// A point in device space, always derived from a fragment transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceCoordinate {
    pub x: f64,
    pub y: f64,
}

/// A bounding region anchored at its baseline (bottom-left) in device space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Page the box belongs to (0-indexed).
    pub page_index: usize,
}

/// A rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopLeftRect {
    pub x: f64,
    /// Y coordinate of the top edge, in device units.
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl TopLeftRect {
    /// Re-derive the baseline-anchored box this rectangle came from.
    pub fn to_bounding_box(&self, page_index: usize) -> BoundingBox {
        BoundingBox {
            x: self.x,
            y: self.top - self.height,
            width: self.width,
            height: self.height,
            page_index,
        }
    }
}

/// Map a fragment-local point to device space.
pub fn to_device_space(transform: &[f64; 6], local_x: f64, local_y: f64) -> DeviceCoordinate {
    let [a, b, c, d, e, f] = *transform;
    DeviceCoordinate {
        x: a * local_x + c * local_y + e,
        y: b * local_x + d * local_y + f,
    }
}

/// Re-anchor a baseline box to its top edge.
pub fn to_top_left_rect(bbox: &BoundingBox) -> TopLeftRect {
    TopLeftRect {
        x: bbox.x,
        top: bbox.y + bbox.height,
        width: bbox.width,
        height: bbox.height,
    }
}

/// Effective glyph size of a text rendering matrix (length of its y axis).
pub fn glyph_scale(transform: &[f64; 6]) -> f64 {
    transform[2].hypot(transform[3])
}
