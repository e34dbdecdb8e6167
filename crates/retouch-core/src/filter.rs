//! Pixel filter pipeline.
//!
//! Builds a declarative [`FilterChain`] from [`FilterParams`] and applies it
//! to RGBA pixel data. The same chain drives live preview, the processed
//! image cache, crop baking and export, so there is exactly one colour
//! algorithm in the editor.
//!
//! ## Effect Order
//! 1. Brightness
//! 2. Contrast (including the sharpen approximation)
//! 3. Saturation
//! 4. Grayscale
//! 5. Sepia
//! 6. Blur
//!
//! ## Colour Formula
//! With `b`, `k`, `s` as percentages:
//!
//! ```text
//! c'  = clamp(0, 255, ((c · b/100) − 128) · k/100 + 128)
//! L   = 0.299·r' + 0.587·g' + 0.114·b'
//! c'' = clamp(0, 255, L + (c' − L) · s/100)
//! ```
//!
//! ## Sharpen
//! Sharpen is approximated by raising contrast by `sharpen_amount × 0.5`
//! percentage points. This is not unsharp masking; it only steepens the
//! tone curve around mid-grey.

use std::fmt::Write as _;

use crate::decode::ImageAsset;
use crate::luminance::{luma601, luma709};
use crate::state::FilterParams;

/// Contrast percentage points added per unit of sharpen.
pub const SHARPEN_CONTRAST_FACTOR: f32 = 0.5;

/// Mid-grey pivot for contrast.
const CONTRAST_PIVOT: f32 = 128.0;

/// CSS `sepia()` colour matrix at 100%.
const SEPIA_MATRIX: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// A single step of the filter chain.
///
/// Percentages are stored as fractions (1.0 = 100%); blur is a Gaussian
/// standard deviation in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterEffect {
    Brightness(f32),
    Contrast(f32),
    Saturate(f32),
    Grayscale(f32),
    Sepia(f32),
    Blur(f32),
}

impl FilterEffect {
    fn write_css(&self, out: &mut String) {
        // Writing into a String cannot fail.
        let _ = match *self {
            FilterEffect::Brightness(v) => write!(out, "brightness({}%)", v * 100.0),
            FilterEffect::Contrast(v) => write!(out, "contrast({}%)", v * 100.0),
            FilterEffect::Saturate(v) => write!(out, "saturate({}%)", v * 100.0),
            FilterEffect::Grayscale(v) => write!(out, "grayscale({}%)", v * 100.0),
            FilterEffect::Sepia(v) => write!(out, "sepia({}%)", v * 100.0),
            FilterEffect::Blur(px) => write!(out, "blur({}px)", px),
        };
    }
}

/// Contrast percentage after folding in the sharpen approximation.
pub fn effective_contrast(params: &FilterParams) -> f32 {
    params.contrast + params.sharpen_amount * SHARPEN_CONTRAST_FACTOR
}

/// Ordered list of filter effects derived from adjustment parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterChain {
    effects: Vec<FilterEffect>,
}

impl FilterChain {
    /// Build the chain for a set of parameters.
    ///
    /// Identity effects are omitted, except that brightness and contrast
    /// always travel together: the colour formula only clamps after the
    /// contrast step, so brightness must never be followed directly by
    /// saturation.
    pub fn from_params(params: &FilterParams) -> Self {
        let mut effects = Vec::with_capacity(6);

        let contrast = effective_contrast(params);
        if params.brightness != 100.0 || contrast != 100.0 {
            effects.push(FilterEffect::Brightness(params.brightness / 100.0));
            effects.push(FilterEffect::Contrast(contrast / 100.0));
        }
        if params.saturation != 100.0 {
            effects.push(FilterEffect::Saturate(params.saturation / 100.0));
        }
        if params.grayscale {
            effects.push(FilterEffect::Grayscale(1.0));
        }
        if params.sepia {
            effects.push(FilterEffect::Sepia(1.0));
        }
        if params.blur_radius > 0.0 {
            effects.push(FilterEffect::Blur(params.blur_radius));
        }

        Self { effects }
    }

    pub fn effects(&self) -> &[FilterEffect] {
        &self.effects
    }

    /// Check if the chain leaves pixels untouched
    pub fn is_identity(&self) -> bool {
        self.effects.is_empty()
    }

    /// Render as a CSS `filter` property value.
    pub fn to_css(&self) -> String {
        if self.effects.is_empty() {
            return "none".to_string();
        }
        let mut css = String::new();
        for (i, effect) in self.effects.iter().enumerate() {
            if i > 0 {
                css.push(' ');
            }
            effect.write_css(&mut css);
        }
        css
    }

    /// Apply the chain to an image, returning a new image of the same size.
    ///
    /// An identity chain returns an exact copy. Alpha is never modified by
    /// the colour effects.
    pub fn apply(&self, image: &ImageAsset) -> ImageAsset {
        if self.is_identity() {
            return image.clone();
        }

        let mut pixels = image.pixels.clone();
        let has_color = self
            .effects
            .iter()
            .any(|e| !matches!(e, FilterEffect::Blur(_)));
        if has_color {
            apply_color_effects(&mut pixels, &self.effects);
        }

        let mut result = ImageAsset::new(image.width, image.height, pixels);
        for effect in &self.effects {
            if let FilterEffect::Blur(sigma) = *effect {
                result = apply_blur(&result, sigma);
            }
        }
        result
    }
}

/// Apply the colour effects of a chain to RGBA pixel data in place.
///
/// Incomplete trailing pixels are left untouched.
fn apply_color_effects(pixels: &mut [u8], effects: &[FilterEffect]) {
    for chunk in pixels.chunks_exact_mut(4) {
        let mut rgb = [chunk[0] as f32, chunk[1] as f32, chunk[2] as f32];

        for effect in effects {
            rgb = match *effect {
                FilterEffect::Brightness(factor) => apply_brightness(rgb, factor),
                FilterEffect::Contrast(factor) => apply_contrast(rgb, factor),
                FilterEffect::Saturate(factor) => apply_saturation(rgb, factor),
                FilterEffect::Grayscale(amount) => apply_grayscale(rgb, amount),
                FilterEffect::Sepia(amount) => apply_sepia(rgb, amount),
                FilterEffect::Blur(_) => rgb,
            };
        }

        for (dst, v) in chunk.iter_mut().zip(rgb) {
            *dst = v.clamp(0.0, 255.0).round() as u8;
        }
    }
}

/// Scale each channel. Not clamped: contrast always follows.
#[inline]
fn apply_brightness(rgb: [f32; 3], factor: f32) -> [f32; 3] {
    rgb.map(|c| c * factor)
}

/// Stretch channels away from mid-grey, then clamp.
#[inline]
fn apply_contrast(rgb: [f32; 3], factor: f32) -> [f32; 3] {
    rgb.map(|c| ((c - CONTRAST_PIVOT) * factor + CONTRAST_PIVOT).clamp(0.0, 255.0))
}

/// Blend toward (or away from) Rec. 601 luma, then clamp.
#[inline]
fn apply_saturation(rgb: [f32; 3], factor: f32) -> [f32; 3] {
    let luma = luma601(rgb[0], rgb[1], rgb[2]);
    rgb.map(|c| (luma + (c - luma) * factor).clamp(0.0, 255.0))
}

#[inline]
fn apply_grayscale(rgb: [f32; 3], amount: f32) -> [f32; 3] {
    let luma = luma709(rgb[0], rgb[1], rgb[2]);
    rgb.map(|c| c + (luma - c) * amount)
}

#[inline]
fn apply_sepia(rgb: [f32; 3], amount: f32) -> [f32; 3] {
    let toned = SEPIA_MATRIX.map(|row| {
        (row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2]).clamp(0.0, 255.0)
    });
    [
        rgb[0] + (toned[0] - rgb[0]) * amount,
        rgb[1] + (toned[1] - rgb[1]) * amount,
        rgb[2] + (toned[2] - rgb[2]) * amount,
    ]
}

/// Gaussian blur with the given standard deviation in pixels.
fn apply_blur(image: &ImageAsset, sigma: f32) -> ImageAsset {
    match image.to_rgba_image() {
        Some(rgba) => ImageAsset::from_rgba_image(image::imageops::blur(&rgba, sigma)),
        None => image.clone(),
    }
}
