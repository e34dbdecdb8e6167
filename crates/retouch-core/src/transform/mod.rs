//! Coordinate-space math shared by the renderer, crop engine and viewport.
//!
//! # Spaces
//!
//! - **Image space**: pixels of the unrotated, unzoomed bitmap. Origin is the
//!   top-left corner.
//! - **Display space**: pixels of the rendered canvas after zoom, rotation
//!   and flip. Origin is the canvas top-left corner.
//!
//! # Composition Order
//!
//! Image → display always runs in this order:
//! 1. Translate so the image centre is the origin
//! 2. Scale by zoom
//! 3. Rotate (clockwise on screen, since y points down)
//! 4. Mirror x for a horizontal flip, y for a vertical flip
//! 5. Translate to the canvas centre
//!
//! [`ViewTransform`] is the only place this sequence is written down. The
//! renderer samples through its inverse and the crop engine maps corners
//! through its forward direction, which is what keeps preview, crop and
//! export in agreement.

mod bounds;
mod region;
mod view;

pub use bounds::{display_size, rotated_bounds, rotation_trig};
pub use region::{bounding_rect, copy_region, PixelRect};
pub use view::{Point, ViewTransform};
