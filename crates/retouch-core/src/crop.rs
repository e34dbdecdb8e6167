//! Crop engine.
//!
//! Three pieces share one [`ViewTransform`]:
//!
//! - **Gesture**: pointer positions on the canvas are mapped back into image
//!   space, so a selection is stored independent of zoom and rotation.
//! - **Overlay**: the selection's corners are mapped forward one by one and
//!   drawn as a polygon, which stays correct under rotation and flips.
//! - **Bake**: the filtered image is rendered at zoom 1 with its current
//!   geometry, and the selection's bounding box in that raster becomes the
//!   new image.
//!
//! # State Machine
//!
//! ```text
//! Idle --pointer_down (tool active)--> Drawing
//! Drawing --pointer_move--> Drawing
//! Drawing --pointer_up--> Idle (emits a CropRequest if large enough)
//! Drawing --pointer_leave--> Idle (emits nothing)
//! ```

use thiserror::Error;

use crate::decode::ImageAsset;
use crate::render::{render_unzoomed, InterpolationFilter};
use crate::state::{AdjustmentState, CropRequest};
use crate::transform::{bounding_rect, copy_region, Point, ViewTransform};

/// Default minimum selection size in image pixels (exclusive).
pub const DEFAULT_MIN_CROP_SIZE: f64 = 10.0;

/// Error types for crop baking.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CropError {
    /// The crop rectangle covers no pixels of the rendered image.
    #[error("Crop region has no area inside the image")]
    InvalidRegion,

    /// There is no image to crop.
    #[error("No image loaded")]
    NoImage,
}

/// Progress of a crop drag.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CropGesture {
    #[default]
    Idle,
    /// Dragging, with both corners in image space.
    Drawing { start: Point, end: Point },
}

/// Pointer-driven crop selection.
#[derive(Debug, Clone)]
pub struct CropTool {
    active: bool,
    gesture: CropGesture,
    min_size: f64,
}

impl Default for CropTool {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CROP_SIZE)
    }
}

impl CropTool {
    /// Create an inactive tool that rejects selections not larger than `min_size`.
    pub fn new(min_size: f64) -> Self {
        Self {
            active: false,
            gesture: CropGesture::Idle,
            min_size,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Toggle the tool. Deactivating abandons any drag in progress.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        if !active {
            self.gesture = CropGesture::Idle;
        }
    }

    pub fn gesture(&self) -> CropGesture {
        self.gesture
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.gesture, CropGesture::Drawing { .. })
    }

    /// Start a selection at a canvas position.
    ///
    /// # Returns
    ///
    /// `true` if a drag started. Ignored while the tool is inactive.
    pub fn pointer_down(&mut self, view: &ViewTransform, display: Point) -> bool {
        if !self.active {
            return false;
        }
        let p = view.display_to_image(display);
        self.gesture = CropGesture::Drawing { start: p, end: p };
        true
    }

    /// Move the free corner of the selection.
    pub fn pointer_move(&mut self, view: &ViewTransform, display: Point) {
        if let CropGesture::Drawing { end, .. } = &mut self.gesture {
            *end = view.display_to_image(display);
        }
    }

    /// Finish the drag.
    ///
    /// # Returns
    ///
    /// The selected region if both sides exceed the minimum size, otherwise
    /// `None`. The tool returns to idle either way.
    pub fn pointer_up(&mut self, view: &ViewTransform, display: Point) -> Option<CropRequest> {
        self.pointer_move(view, display);
        let request = self.selection()?;
        self.gesture = CropGesture::Idle;

        if request.width > self.min_size && request.height > self.min_size {
            tracing::debug!(?request, "crop selection");
            Some(request)
        } else {
            tracing::debug!(
                width = request.width,
                height = request.height,
                "discarding small crop selection"
            );
            None
        }
    }

    /// Abandon the drag without emitting anything.
    pub fn pointer_leave(&mut self) {
        self.gesture = CropGesture::Idle;
    }

    /// The in-progress selection, if dragging.
    pub fn selection(&self) -> Option<CropRequest> {
        match self.gesture {
            CropGesture::Idle => None,
            CropGesture::Drawing { start, end } => Some(CropRequest::from_corners(start, end)),
        }
    }

    /// Overlay polygon for the in-progress selection.
    pub fn overlay(&self, view: &ViewTransform) -> Option<[Point; 4]> {
        self.selection().map(|req| overlay_polygon(view, &req))
    }
}

/// Map a crop rectangle onto the canvas, corner by corner.
///
/// Corners are returned clockwise in image space starting at the top-left.
/// Under rotation or flips the result is generally not axis-aligned.
pub fn overlay_polygon(view: &ViewTransform, request: &CropRequest) -> [Point; 4] {
    view.map_quad(request.corners())
}

/// Bake the current view and cut out a crop region.
///
/// # Arguments
///
/// * `processed` - Filtered bitmap at natural resolution
/// * `adjustments` - Supplies rotation and flips
/// * `request` - Region in image space
/// * `filter` - Interpolation used for the zoom-1 render
///
/// # Returns
///
/// A new image holding exactly the pixels that were inside the selection on
/// screen, with rotation, flips and filters baked in.
///
/// # Errors
///
/// Returns `CropError::InvalidRegion` when the region's bounding box has no
/// area inside the rendered raster. Nothing is mutated in that case.
pub fn bake_crop(
    processed: &ImageAsset,
    adjustments: &AdjustmentState,
    request: &CropRequest,
    filter: InterpolationFilter,
) -> Result<ImageAsset, CropError> {
    let finite = [request.x, request.y, request.width, request.height]
        .iter()
        .all(|v| v.is_finite());
    if !finite {
        tracing::warn!(?request, "crop request is not finite");
        return Err(CropError::InvalidRegion);
    }

    let (raster, view) = render_unzoomed(processed, adjustments, filter);
    let corners = view.map_quad(request.corners());

    let Some(rect) = bounding_rect(&corners, raster.width, raster.height) else {
        tracing::warn!(?request, "crop region is empty after transform");
        return Err(CropError::InvalidRegion);
    };

    let cropped = copy_region(&raster, rect);
    tracing::debug!(
        x = rect.x,
        y = rect.y,
        width = rect.width,
        height = rect.height,
        "baked crop"
    );
    Ok(cropped)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: a whole-pixel region inside the image bakes to the same
        /// area, with sides swapped by quarter turns.
        #[test]
        fn prop_bake_preserves_area(
            (width, height) in (20u32..=60, 20u32..=60),
            rotation in prop::sample::select(vec![0u32, 90, 180, 270]),
            flip_h in any::<bool>(),
            fx in 0.0f64..0.5,
            fy in 0.0f64..0.5,
            fw in 0.1f64..0.5,
            fh in 0.1f64..0.5,
        ) {
            let img = ImageAsset::new(width, height, [50u8, 60, 70, 255].repeat((width * height) as usize));
            let adj = AdjustmentState {
                rotation_degrees: rotation,
                flip_horizontal: flip_h,
                ..AdjustmentState::default()
            };
            let req = CropRequest {
                x: (fx * width as f64).floor(),
                y: (fy * height as f64).floor(),
                width: (fw * width as f64).floor().max(1.0),
                height: (fh * height as f64).floor().max(1.0),
            };

            let out = bake_crop(&img, &adj, &req, InterpolationFilter::Bilinear).unwrap();
            let (w, h) = (req.width as u32, req.height as u32);
            if rotation % 180 == 0 {
                prop_assert_eq!((out.width, out.height), (w, h));
            } else {
                prop_assert_eq!((out.width, out.height), (h, w));
            }
            prop_assert!(out.pixels.chunks_exact(4).all(|p| p == [50, 60, 70, 255]));
        }
    }
}
