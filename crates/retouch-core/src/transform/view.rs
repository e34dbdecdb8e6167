//! Forward and inverse mapping between image space and display space.

use serde::{Deserialize, Serialize};

use super::bounds::{display_size, rotation_trig};
use crate::state::AdjustmentState;

/// A point in either image or display space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// The complete image → display composition for one rendered view.
///
/// Built from the image dimensions, the geometric part of
/// [`AdjustmentState`] and a zoom factor. The display canvas is sized by
/// [`display_size`], and both directions use the same centre points so the
/// mapping round-trips exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    image_width: u32,
    image_height: u32,
    sin: f64,
    cos: f64,
    flip_horizontal: bool,
    flip_vertical: bool,
    zoom: f64,
    canvas_width: u32,
    canvas_height: u32,
}

impl ViewTransform {
    /// Create the transform for drawing an image with the given adjustments at `zoom`.
    pub fn new(image_width: u32, image_height: u32, adjustments: &AdjustmentState, zoom: f64) -> Self {
        let degrees = adjustments.rotation_degrees as f64;
        let (sin, cos) = rotation_trig(degrees);
        let (canvas_width, canvas_height) = display_size(image_width, image_height, degrees, zoom);

        Self {
            image_width,
            image_height,
            sin,
            cos,
            flip_horizontal: adjustments.flip_horizontal,
            flip_vertical: adjustments.flip_vertical,
            zoom,
            canvas_width,
            canvas_height,
        }
    }

    /// Display canvas dimensions as (width, height).
    pub fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }

    /// Source image dimensions as (width, height).
    pub fn image_size(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// True when every image pixel lands on the same canvas pixel.
    pub fn is_identity(&self) -> bool {
        self.sin == 0.0
            && self.cos == 1.0
            && !self.flip_horizontal
            && !self.flip_vertical
            && self.canvas_size() == self.image_size()
            && (self.zoom - 1.0).abs() < f64::EPSILON
    }

    /// Map an image-space point onto the display canvas.
    pub fn image_to_display(&self, p: Point) -> Point {
        let dx = (p.x - self.image_width as f64 / 2.0) * self.zoom;
        let dy = (p.y - self.image_height as f64 / 2.0) * self.zoom;

        let mut rx = dx * self.cos - dy * self.sin;
        let mut ry = dx * self.sin + dy * self.cos;

        if self.flip_horizontal {
            rx = -rx;
        }
        if self.flip_vertical {
            ry = -ry;
        }

        Point::new(
            rx + self.canvas_width as f64 / 2.0,
            ry + self.canvas_height as f64 / 2.0,
        )
    }

    /// Map a display-space point back into the image, clamped to the image bounds.
    pub fn display_to_image(&self, p: Point) -> Point {
        let raw = self.display_to_image_unclamped(p);
        Point::new(
            raw.x.clamp(0.0, self.image_width as f64),
            raw.y.clamp(0.0, self.image_height as f64),
        )
    }

    /// Exact inverse of [`image_to_display`](Self::image_to_display).
    ///
    /// Points outside the drawn image map outside `[0,w] × [0,h]`; the
    /// renderer relies on this to leave those canvas pixels transparent.
    pub fn display_to_image_unclamped(&self, p: Point) -> Point {
        let mut rx = p.x - self.canvas_width as f64 / 2.0;
        let mut ry = p.y - self.canvas_height as f64 / 2.0;

        if self.flip_horizontal {
            rx = -rx;
        }
        if self.flip_vertical {
            ry = -ry;
        }

        // Rotate by -θ
        let dx = rx * self.cos + ry * self.sin;
        let dy = -rx * self.sin + ry * self.cos;

        Point::new(
            dx / self.zoom + self.image_width as f64 / 2.0,
            dy / self.zoom + self.image_height as f64 / 2.0,
        )
    }

    /// Map each corner individually.
    ///
    /// Under rotation an axis-aligned image rectangle becomes a general
    /// quadrilateral, so callers must not take a bounding box first.
    pub fn map_quad(&self, corners: [Point; 4]) -> [Point; 4] {
        corners.map(|c| self.image_to_display(c))
    }
}
