//! Lossless PNG encoding, alpha preserved.

use image::codecs::png::PngEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;
use std::io::Cursor;

use super::{validate, EncodeError};
use crate::decode::ImageAsset;

/// Encode an image to RGBA PNG bytes.
pub fn encode_png(image: &ImageAsset) -> Result<Vec<u8>, EncodeError> {
    validate(image)?;

    let mut buffer = Cursor::new(Vec::new());
    PngEncoder::new(&mut buffer)
        .write_image(&image.pixels, image.width, image.height, ExtendedColorType::Rgba8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}
