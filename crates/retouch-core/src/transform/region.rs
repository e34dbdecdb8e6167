//! Axis-aligned pixel regions: bounding boxes of mapped points and sub-image copies.

use super::view::Point;
use crate::decode::ImageAsset;

/// Slack allowed before rounding a coordinate outward.
///
/// A corner that lands at 499.9999999997 after trig should still be pixel
/// 500, not grow the region by a whole column.
const SNAP_EPSILON: f64 = 1e-6;

/// An axis-aligned rectangle in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Compute the pixel bounding box of a set of points, clamped to a raster.
///
/// Edges are rounded outward (floor for the minimum, ceil for the maximum)
/// so every covered pixel is included.
///
/// # Returns
///
/// `None` when the clamped box has no area, which happens when the points
/// lie entirely outside the raster or collapse onto a line.
pub fn bounding_rect(points: &[Point], limit_width: u32, limit_height: u32) -> Option<PixelRect> {
    if points.is_empty() {
        return None;
    }

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let left = (min_x + SNAP_EPSILON).floor().max(0.0);
    let top = (min_y + SNAP_EPSILON).floor().max(0.0);
    let right = (max_x - SNAP_EPSILON).ceil().min(limit_width as f64);
    let bottom = (max_y - SNAP_EPSILON).ceil().min(limit_height as f64);

    let width = right - left;
    let height = bottom - top;
    if !(width > 0.0 && height > 0.0) {
        return None;
    }

    Some(PixelRect {
        x: left as u32,
        y: top as u32,
        width: width as u32,
        height: height as u32,
    })
}

/// Copy a sub-rectangle of an image into a new image.
///
/// The rectangle is clamped to the image bounds; a rectangle that falls
/// entirely outside produces an empty image.
pub fn copy_region(image: &ImageAsset, rect: PixelRect) -> ImageAsset {
    let left = rect.x.min(image.width);
    let top = rect.y.min(image.height);
    let out_width = rect.width.min(image.width - left);
    let out_height = rect.height.min(image.height - top);

    let row_bytes = out_width as usize * 4;
    let mut output = Vec::with_capacity(row_bytes * out_height as usize);

    // Copy pixel data row by row
    for y in 0..out_height {
        let src_start = ((top + y) as usize * image.width as usize + left as usize) * 4;
        output.extend_from_slice(&image.pixels[src_start..src_start + row_bytes]);
    }

    ImageAsset::new(out_width, out_height, output)
}
