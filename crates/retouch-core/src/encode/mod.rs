//! Image encoding for export.
//!
//! This module provides functionality for:
//! - Encoding images to PNG (lossless, alpha preserved)
//! - Encoding images to JPEG with configurable quality, flattened over black
//! - Choosing a format at the export boundary with a PNG fallback
//!
//! # Examples
//!
//! ```ignore
//! use retouch_core::encode::{export_image, ExportFormat};
//!
//! let out = export_image(&rendered, &ExportFormat::from_mime("image/jpeg"), Some(0.9), 0.92)?;
//! if let Some(warning) = &out.warning {
//!     show_toast(&warning.to_string());
//! }
//! ```

mod export;
mod jpeg;
mod png;

use thiserror::Error;

use crate::decode::ImageAsset;

pub use export::{export_image, ExportFormat, ExportOutput, ExportWarning, JPEG_MIME, PNG_MIME};
pub use jpeg::{encode_jpeg, jpeg_quality};
pub use png::encode_png;

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The encoder rejected the image
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    /// PNG export failed, including as a fallback
    #[error("Export failed: {0}")]
    ExportFailed(String),
}

/// Check dimensions and buffer length before handing pixels to an encoder.
fn validate(image: &ImageAsset) -> Result<(), EncodeError> {
    let (width, height) = (image.width, image.height);
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = width as usize * height as usize * 4;
    if image.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: image.pixels.len(),
        });
    }
    Ok(())
}
