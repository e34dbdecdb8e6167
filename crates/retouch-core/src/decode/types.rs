//! Core types for image decoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for image decoding operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes do not match the declared format.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// The decoded image has no pixels.
    #[error("Image has zero width or height")]
    EmptyImage,
}

/// Image formats accepted at the upload boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadFormat {
    Jpeg,
    Png,
}

impl UploadFormat {
    /// Map a MIME type to an accepted format.
    ///
    /// Returns `None` for anything other than JPEG or PNG; callers treat
    /// that as a silent no-op rather than an error.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(UploadFormat::Jpeg),
            "image/png" => Some(UploadFormat::Png),
            _ => None,
        }
    }

    /// Convert to the image crate's format.
    pub fn to_image_format(self) -> image::ImageFormat {
        match self {
            UploadFormat::Jpeg => image::ImageFormat::Jpeg,
            UploadFormat::Png => image::ImageFormat::Png,
        }
    }
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// An immutable decoded bitmap with RGBA pixel data.
///
/// Assets are never edited in place. Uploads and crop bakes produce new
/// assets, and the session swaps them in wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// RGBA pixel data in row-major order (4 bytes per pixel, not premultiplied).
    /// Length should be width * height * 4.
    pub pixels: Vec<u8>,
}

impl ImageAsset {
    /// Create a new ImageAsset with the given dimensions and pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * 4,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create a fully transparent image.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self::new(width, height, vec![0u8; width as usize * height as usize * 4])
    }

    /// Create an ImageAsset from an image::RgbaImage.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    /// Convert to an image::RgbaImage for further processing.
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// RGBA value at (x, y). Panics if out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_format_from_mime() {
        assert_eq!(UploadFormat::from_mime("image/jpeg"), Some(UploadFormat::Jpeg));
        assert_eq!(UploadFormat::from_mime("image/jpg"), Some(UploadFormat::Jpeg));
        assert_eq!(UploadFormat::from_mime("IMAGE/PNG"), Some(UploadFormat::Png));
        assert_eq!(UploadFormat::from_mime("image/gif"), None);
        assert_eq!(UploadFormat::from_mime("text/plain"), None);
        assert_eq!(UploadFormat::from_mime(""), None);
    }

    #[test]
    fn test_orientation_from_u32() {
        assert_eq!(Orientation::from(1), Orientation::Normal);
        assert_eq!(Orientation::from(6), Orientation::Rotate90CW);
        assert_eq!(Orientation::from(99), Orientation::Normal);
    }

    #[test]
    fn test_image_asset_creation() {
        let img = ImageAsset::new(100, 50, vec![0u8; 100 * 50 * 4]);
        assert_eq!(img.width, 100);
        assert_eq!(img.height, 50);
        assert_eq!(img.pixel_count(), 5000);
        assert!(!img.is_empty());
    }

    #[test]
    fn test_image_asset_empty() {
        assert!(ImageAsset::new(0, 0, vec![]).is_empty());
    }

    #[test]
    fn test_transparent_and_pixel_access() {
        let mut img = ImageAsset::transparent(3, 2);
        assert_eq!(img.pixel(2, 1), [0, 0, 0, 0]);
        let idx = (3 + 2) * 4;
        img.pixels[idx..idx + 4].copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(img.pixel(2, 1), [1, 2, 3, 4]);
    }

    #[test]
    fn test_rgba_image_round_trip() {
        let img = ImageAsset::new(2, 1, vec![10, 20, 30, 255, 40, 50, 60, 128]);
        let rgba = img.to_rgba_image().unwrap();
        assert_eq!(ImageAsset::from_rgba_image(rgba), img);
    }

    #[test]
    fn test_decode_error_display() {
        assert_eq!(
            DecodeError::InvalidFormat.to_string(),
            "Invalid or unsupported image format"
        );
        assert_eq!(
            DecodeError::CorruptedFile("eof".to_string()).to_string(),
            "Corrupted or incomplete image file: eof"
        );
    }
}
