//! Upload decoding with EXIF orientation handling.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::DynamicImage;

use super::{DecodeError, ImageAsset, Orientation, UploadFormat};

/// Decode an uploaded file, ignoring anything that is not JPEG or PNG.
///
/// # Arguments
///
/// * `bytes` - Raw file bytes
/// * `mime` - MIME type reported by the browser
///
/// # Returns
///
/// `Ok(None)` for unsupported MIME types, so the caller can drop the upload
/// without touching editor state. `Ok(Some(asset))` on success.
///
/// # Errors
///
/// Returns `DecodeError::CorruptedFile` if the bytes cannot be decoded as
/// the declared format, and `DecodeError::EmptyImage` for zero-sized images.
pub fn decode_upload(bytes: &[u8], mime: &str) -> Result<Option<ImageAsset>, DecodeError> {
    let Some(format) = UploadFormat::from_mime(mime) else {
        tracing::debug!(mime, "ignoring upload with unsupported type");
        return Ok(None);
    };
    decode_image(bytes, format).map(Some)
}

/// Decode image bytes of a known format into RGBA, applying EXIF orientation.
pub fn decode_image(bytes: &[u8], format: UploadFormat) -> Result<ImageAsset, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = image::load_from_memory_with_format(bytes, format.to_image_format())
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let orientation = match format {
        UploadFormat::Jpeg => get_orientation(bytes),
        UploadFormat::Png => Orientation::Normal,
    };
    let asset = ImageAsset::from_rgba_image(apply_orientation(img, orientation).into_rgba8());

    if asset.is_empty() {
        return Err(DecodeError::EmptyImage);
    }

    tracing::debug!(
        width = asset.width,
        height = asset.height,
        ?orientation,
        "decoded upload"
    );
    Ok(asset)
}

/// Extract EXIF orientation from JPEG bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
pub fn get_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    Reader::new()
        .read_from_container(&mut cursor)
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .map(Orientation::from)
        .unwrap_or_default()
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
