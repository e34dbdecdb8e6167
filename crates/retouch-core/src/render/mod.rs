//! View rendering.
//!
//! Produces the pixels of the display canvas for a processed bitmap under a
//! [`ViewTransform`]. Rendering is headless: it yields an [`ImageAsset`]
//! which a [`RenderTarget`] then presents. The same routine at zoom 1 feeds
//! crop baking and export, so preview and output never disagree about
//! geometry.
//!
//! # Algorithm
//!
//! Inverse mapping: for each destination pixel centre, find the image-space
//! point that lands there and interpolate the processed bitmap at that
//! point. Canvas pixels whose preimage falls outside the image stay
//! transparent.

mod sample;

use thiserror::Error;

pub use sample::{sample_bilinear, sample_lanczos3};

use crate::decode::ImageAsset;
use crate::state::AdjustmentState;
use crate::transform::{Point, ViewTransform};

/// Interpolation filter for view rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationFilter {
    /// Fast bilinear interpolation - good for preview rendering.
    #[default]
    Bilinear,
    /// High-quality Lanczos3 interpolation - good for export.
    Lanczos3,
}

/// Error types for presenting frames.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The drawing surface or its 2D context could not be obtained.
    #[error("Rendering context unavailable: {0}")]
    ContextUnavailable(String),
}

/// A surface that can present rendered frames.
pub trait RenderTarget {
    /// Resize the backing surface to exactly `width × height` pixels.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError>;

    /// Clear the surface to transparent.
    fn clear(&mut self) -> Result<(), RenderError>;

    /// Copy a frame onto the surface at the origin.
    fn put_frame(&mut self, frame: &ImageAsset) -> Result<(), RenderError>;
}

/// In-memory render target.
///
/// Keeps the most recently presented frame. Useful for tests and for any
/// caller that wants the composited view as pixels.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    frame: Option<ImageAsset>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> Option<&ImageAsset> {
        self.frame.as_ref()
    }

    /// Surface size, or (0, 0) before the first resize.
    pub fn size(&self) -> (u32, u32) {
        self.frame
            .as_ref()
            .map(|f| (f.width, f.height))
            .unwrap_or((0, 0))
    }
}

impl RenderTarget for FrameBuffer {
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.frame = Some(ImageAsset::transparent(width, height));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), RenderError> {
        if let Some(frame) = &mut self.frame {
            frame.pixels.fill(0);
        }
        Ok(())
    }

    fn put_frame(&mut self, frame: &ImageAsset) -> Result<(), RenderError> {
        let Some(surface) = &mut self.frame else {
            return Err(RenderError::ContextUnavailable(
                "frame buffer has not been sized".to_string(),
            ));
        };
        if (surface.width, surface.height) != (frame.width, frame.height) {
            *surface = ImageAsset::transparent(frame.width, frame.height);
        }
        surface.pixels.copy_from_slice(&frame.pixels);
        Ok(())
    }
}

/// Render the processed bitmap into a new canvas-sized image.
///
/// # Arguments
///
/// * `processed` - Filtered bitmap at natural resolution
/// * `view` - Geometry of the view (rotation, flips, zoom, canvas size)
/// * `filter` - Interpolation method (Bilinear for preview, Lanczos3 for export)
///
/// # Returns
///
/// New `ImageAsset` sized to `view.canvas_size()`.
pub fn render_view(processed: &ImageAsset, view: &ViewTransform, filter: InterpolationFilter) -> ImageAsset {
    // Fast path: nothing to resample
    if view.is_identity() && view.image_size() == (processed.width, processed.height) {
        return processed.clone();
    }

    let (dst_w, dst_h) = view.canvas_size();
    let mut output = vec![0u8; dst_w as usize * dst_h as usize * 4];

    for (dst_y, row) in output.chunks_exact_mut(dst_w as usize * 4).enumerate() {
        for (dst_x, out) in row.chunks_exact_mut(4).enumerate() {
            let centre = Point::new(dst_x as f64 + 0.5, dst_y as f64 + 0.5);
            let src = view.display_to_image_unclamped(centre);

            let pixel = match filter {
                InterpolationFilter::Bilinear => sample_bilinear(processed, src.x, src.y),
                InterpolationFilter::Lanczos3 => sample_lanczos3(processed, src.x, src.y),
            };
            out.copy_from_slice(&pixel);
        }
    }

    ImageAsset::new(dst_w, dst_h, output)
}

/// Render at zoom 1 with the given adjustments' geometry.
///
/// This is the raster that crop baking and export operate on.
pub fn render_unzoomed(
    processed: &ImageAsset,
    adjustments: &AdjustmentState,
    filter: InterpolationFilter,
) -> (ImageAsset, ViewTransform) {
    let view = ViewTransform::new(processed.width, processed.height, adjustments, 1.0);
    (render_view(processed, &view, filter), view)
}

/// Draws processed bitmaps onto a render target.
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    filter: InterpolationFilter,
}

impl Renderer {
    pub fn new(filter: InterpolationFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> InterpolationFilter {
        self.filter
    }

    /// Render and present one view.
    ///
    /// The frame is fully rendered before the target is touched, so a
    /// failing target never leaves a half-drawn canvas behind a successful
    /// render.
    ///
    /// # Returns
    ///
    /// The `ViewTransform` used, so callers can map pointer input and
    /// overlays against exactly what was drawn.
    ///
    /// # Errors
    ///
    /// Propagates `RenderError` from the target.
    pub fn draw<T: RenderTarget + ?Sized>(
        &self,
        target: &mut T,
        processed: &ImageAsset,
        adjustments: &AdjustmentState,
        zoom: f64,
    ) -> Result<ViewTransform, RenderError> {
        let view = ViewTransform::new(processed.width, processed.height, adjustments, zoom);
        let frame = render_view(processed, &view, self.filter);

        let (width, height) = view.canvas_size();
        target.resize(width, height)?;
        target.clear()?;
        target.put_frame(&frame)?;

        tracing::trace!(width, height, zoom, "drew frame");
        Ok(view)
    }
}
