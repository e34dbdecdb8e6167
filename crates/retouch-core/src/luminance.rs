//! Luminance weights used by the colour filters.
//!
//! Two sets of coefficients are in play, matching the browser's filter
//! behaviour:
//!
//! - Saturation blends toward Rec. 601 luma (`0.299 / 0.587 / 0.114`).
//! - Grayscale uses the Rec. 709 weights of the CSS `grayscale()` matrix.

/// ITU-R BT.601 luma coefficients (R, G, B).
pub const REC601: [f32; 3] = [0.299, 0.587, 0.114];

/// ITU-R BT.709 luminance coefficients (R, G, B).
pub const REC709: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Rec. 601 luma of an RGB triple in the 0-255 range.
#[inline]
pub fn luma601(r: f32, g: f32, b: f32) -> f32 {
    REC601[0] * r + REC601[1] * g + REC601[2] * b
}

/// Rec. 709 luminance of an RGB triple in the 0-255 range.
#[inline]
pub fn luma709(r: f32, g: f32, b: f32) -> f32 {
    REC709[0] * r + REC709[1] * g + REC709[2] * b
}
