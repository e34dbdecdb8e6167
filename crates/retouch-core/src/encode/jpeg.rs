//! JPEG encoding for export.
//!
//! JPEG has no alpha channel. Transparent pixels (such as the corners of a
//! rotated canvas) are composited over black before encoding, matching what
//! a browser canvas produces for `image/jpeg`.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;
use std::io::Cursor;

use super::{validate, EncodeError};
use crate::decode::ImageAsset;

/// Encode an image to JPEG bytes.
///
/// # Arguments
///
/// * `image` - RGBA image to encode
/// * `quality` - JPEG quality (1-100, where 100 is highest quality)
///
/// # Returns
///
/// JPEG-encoded bytes on success, or an error if encoding fails.
///
/// # Quality Guidelines
///
/// * 90-100: High quality, suitable for archival or further editing
/// * 80-90: Good quality, recommended for most uses
/// * 60-80: Medium quality, acceptable for web/social media
/// * Below 60: Low quality, visible artifacts
pub fn encode_jpeg(image: &ImageAsset, quality: u8) -> Result<Vec<u8>, EncodeError> {
    validate(image)?;

    // Clamp quality to valid range (1-100)
    let quality = quality.clamp(1, 100);
    let rgb = flatten_over_black(&image.pixels);

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder
        .write_image(&rgb, image.width, image.height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

/// Map a `(0, 1]` quality fraction onto the encoder's 1-100 scale.
///
/// Values outside `(0, 1]` fall back to `default`.
pub fn jpeg_quality(fraction: Option<f64>, default: f64) -> u8 {
    let valid = |q: f64| q > 0.0 && q <= 1.0;
    let q = match fraction {
        Some(q) if valid(q) => q,
        _ if valid(default) => default,
        _ => 0.92,
    };
    (q * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Composite straight-alpha RGBA over opaque black, producing RGB.
fn flatten_over_black(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let alpha = px[3] as u32;
        for &c in &px[..3] {
            rgb.push(((c as u32 * alpha + 127) / 255) as u8);
        }
    }
    rgb
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: Encoding always produces valid JPEG when given valid input.
        #[test]
        fn prop_valid_input_produces_valid_jpeg(
            (width, height) in (1u32..=50, 1u32..=50),
            quality in 1u8..=100,
            alpha in any::<u8>(),
        ) {
            let img = ImageAsset::new(width, height, [90u8, 160, 30, alpha].repeat((width * height) as usize));
            let jpeg_bytes = encode_jpeg(&img, quality).unwrap();

            prop_assert_eq!(&jpeg_bytes[0..2], &[0xFF, 0xD8], "Should have SOI marker");
            let len = jpeg_bytes.len();
            prop_assert_eq!(&jpeg_bytes[len - 2..], &[0xFF, 0xD9], "Should have EOI marker");
        }

        /// Property: Same input always produces same output (deterministic).
        #[test]
        fn prop_deterministic_output(
            (width, height) in (1u32..=20, 1u32..=20),
            quality in 1u8..=100,
        ) {
            let img = ImageAsset::new(width, height, [100u8, 100, 100, 255].repeat((width * height) as usize));
            prop_assert_eq!(encode_jpeg(&img, quality).unwrap(), encode_jpeg(&img, quality).unwrap());
        }

        /// Property: Every fraction in (0, 1] maps into 1..=100.
        #[test]
        fn prop_quality_fraction_in_range(q in 0.0001f64..=1.0) {
            let mapped = jpeg_quality(Some(q), 0.92);
            prop_assert!((1..=100).contains(&mapped));
        }
    }
}
