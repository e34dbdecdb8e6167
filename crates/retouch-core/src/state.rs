//! Editor data model: adjustment parameters, viewport state and crop requests.
//!
//! `AdjustmentState` splits into two groups with very different costs:
//!
//! - **Pixel filters** (brightness, contrast, saturation, grayscale, sepia,
//!   blur, sharpen) are baked into the processed bitmap and cached.
//! - **Geometry** (rotation, flips) is applied at draw time together with
//!   zoom and pan, so changing it never re-runs the filters.

use serde::{Deserialize, Serialize};

use crate::transform::Point;

/// Valid range for the percentage adjustments (brightness, contrast, saturation).
pub const PERCENT_RANGE: (f32, f32) = (0.0, 200.0);

/// Valid range for the blur radius in pixels.
pub const BLUR_RANGE: (f32, f32) = (0.0, 10.0);

/// Valid range for the sharpen amount.
pub const SHARPEN_RANGE: (f32, f32) = (0.0, 200.0);

/// Complete set of non-destructive edits applied to the current image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentState {
    /// Brightness percentage (0 to 200, 100 = identity)
    pub brightness: f32,
    /// Contrast percentage (0 to 200, 100 = identity)
    pub contrast: f32,
    /// Saturation percentage (0 to 200, 100 = identity)
    pub saturation: f32,
    /// Full grayscale conversion
    pub grayscale: bool,
    /// Full sepia toning
    pub sepia: bool,
    /// Gaussian blur radius in pixels (0 to 10)
    pub blur_radius: f32,
    /// Sharpen amount (0 to 200, 0 = identity)
    pub sharpen_amount: f32,
    /// Rotation in degrees, always one of 0, 90, 180, 270
    pub rotation_degrees: u32,
    /// Mirror left-to-right
    pub flip_horizontal: bool,
    /// Mirror top-to-bottom
    pub flip_vertical: bool,
}

impl Default for AdjustmentState {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            grayscale: false,
            sepia: false,
            blur_radius: 0.0,
            sharpen_amount: 0.0,
            rotation_degrees: 0,
            flip_horizontal: false,
            flip_vertical: false,
        }
    }
}

impl AdjustmentState {
    /// Create a new AdjustmentState with identity values
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if all values are at their identity defaults
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Return a copy with every field coerced into its valid range.
    ///
    /// Non-finite values fall back to the identity value for that field.
    pub fn clamped(&self) -> Self {
        Self {
            brightness: clamp_or(self.brightness, PERCENT_RANGE, 100.0),
            contrast: clamp_or(self.contrast, PERCENT_RANGE, 100.0),
            saturation: clamp_or(self.saturation, PERCENT_RANGE, 100.0),
            blur_radius: clamp_or(self.blur_radius, BLUR_RANGE, 0.0),
            sharpen_amount: clamp_or(self.sharpen_amount, SHARPEN_RANGE, 0.0),
            rotation_degrees: normalize_rotation(self.rotation_degrees),
            ..*self
        }
    }

    /// Rotate a quarter turn clockwise.
    pub fn rotate_clockwise(&mut self) {
        self.rotation_degrees = normalize_rotation(self.rotation_degrees + 90);
    }

    /// Restore brightness, contrast and saturation, keeping everything else.
    pub fn reset_color(&mut self) {
        let identity = Self::default();
        self.brightness = identity.brightness;
        self.contrast = identity.contrast;
        self.saturation = identity.saturation;
    }

    /// The pixel-filter subset of this state.
    pub fn filter_params(&self) -> FilterParams {
        FilterParams {
            brightness: self.brightness,
            contrast: self.contrast,
            saturation: self.saturation,
            grayscale: self.grayscale,
            sepia: self.sepia,
            blur_radius: self.blur_radius,
            sharpen_amount: self.sharpen_amount,
        }
    }

    /// Canonical serialization of all ten fields.
    pub fn fingerprint(&self) -> String {
        fingerprint(self)
    }
}

/// The adjustments that are baked into pixels.
///
/// This is the cache key material: rotation and flips are deliberately
/// absent so that geometry changes reuse the processed bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub grayscale: bool,
    pub sepia: bool,
    pub blur_radius: f32,
    pub sharpen_amount: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        AdjustmentState::default().filter_params()
    }
}

impl FilterParams {
    /// Check if these filters leave pixels untouched
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Canonical serialization used as the processed-image cache key.
    pub fn fingerprint(&self) -> String {
        fingerprint(self)
    }
}

/// Serialize parameters in declaration order.
///
/// Struct fields always serialize in the order they are declared, so two
/// equal values produce identical strings regardless of how they were built.
fn fingerprint<T: Serialize>(value: &T) -> String {
    // Plain structs of numbers and bools cannot fail to serialize.
    serde_json::to_string(value).unwrap_or_default()
}

/// Normalize any rotation into 0, 90, 180 or 270, snapping to the nearest quarter turn.
pub fn normalize_rotation(degrees: u32) -> u32 {
    let snapped = ((degrees % 360) + 45) / 90 * 90;
    snapped % 360
}

fn clamp_or(value: f32, (min, max): (f32, f32), fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// Zoom and pan of the visible canvas.
///
/// `pan` is the offset of the canvas centre from the container centre in
/// CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub zoom: f64,
    pub pan: Point,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Point::new(0.0, 0.0),
        }
    }
}

/// An axis-aligned crop region in image-space pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRequest {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRequest {
    /// Build the request spanned by two opposite corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    /// Corners in clockwise order starting at the top-left.
    pub fn corners(&self) -> [Point; 4] {
        let (x0, y0) = (self.x, self.y);
        let (x1, y1) = (self.x + self.width, self.y + self.height);
        [
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]
    }
}
