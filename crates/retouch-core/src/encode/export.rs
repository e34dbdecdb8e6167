//! Export boundary: format selection with PNG fallback.

use std::fmt;

use super::{encode_jpeg, encode_png, jpeg_quality, EncodeError};
use crate::decode::ImageAsset;

pub const PNG_MIME: &str = "image/png";
pub const JPEG_MIME: &str = "image/jpeg";

/// Requested export format.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    /// Any other MIME type; exported as PNG with a warning.
    Unsupported(String),
}

impl ExportFormat {
    /// Parse a MIME type. An empty string selects the PNG default.
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_ascii_lowercase().as_str() {
            "" | PNG_MIME => ExportFormat::Png,
            JPEG_MIME | "image/jpg" => ExportFormat::Jpeg,
            _ => ExportFormat::Unsupported(mime.to_string()),
        }
    }

    pub fn mime(&self) -> &str {
        match self {
            ExportFormat::Png => PNG_MIME,
            ExportFormat::Jpeg => JPEG_MIME,
            ExportFormat::Unsupported(mime) => mime.as_str(),
        }
    }
}

/// Non-fatal notice that the export was written as PNG instead of the
/// requested format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportWarning {
    pub requested: String,
    pub reason: String,
}

impl fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Could not export as {} ({}); saved as PNG instead",
            self.requested, self.reason
        )
    }
}

/// Encoded export result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutput {
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`, which differs from the request after a fallback
    pub mime: &'static str,
    pub warning: Option<ExportWarning>,
}

/// Encode a flattened image in the requested format.
///
/// # Arguments
///
/// * `image` - The rendered image (filters and geometry already baked)
/// * `format` - Requested format
/// * `quality` - JPEG quality fraction in (0, 1]; ignored for PNG
/// * `default_quality` - Used when `quality` is missing or out of range
///
/// # Errors
///
/// Returns `EncodeError::ExportFailed` when PNG encoding fails, whether
/// requested directly or as the fallback. There is no further retry.
pub fn export_image(
    image: &ImageAsset,
    format: &ExportFormat,
    quality: Option<f64>,
    default_quality: f64,
) -> Result<ExportOutput, EncodeError> {
    let warning = match format {
        ExportFormat::Png => None,
        ExportFormat::Jpeg => match encode_jpeg(image, jpeg_quality(quality, default_quality)) {
            Ok(bytes) => {
                return Ok(ExportOutput {
                    bytes,
                    mime: JPEG_MIME,
                    warning: None,
                })
            }
            Err(e) => Some(ExportWarning {
                requested: JPEG_MIME.to_string(),
                reason: e.to_string(),
            }),
        },
        ExportFormat::Unsupported(mime) => Some(ExportWarning {
            requested: mime.clone(),
            reason: "format not supported".to_string(),
        }),
    };

    if let Some(w) = &warning {
        tracing::warn!(requested = %w.requested, reason = %w.reason, "falling back to PNG export");
    }

    let bytes = encode_png(image).map_err(|e| EncodeError::ExportFailed(e.to_string()))?;
    tracing::debug!(
        width = image.width,
        height = image.height,
        bytes = bytes.len(),
        "exported PNG"
    );
    Ok(ExportOutput {
        bytes,
        mime: PNG_MIME,
        warning,
    })
}
