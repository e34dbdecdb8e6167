//! Rotated bounding boxes and canvas sizing.

/// Tolerance in degrees for treating an angle as an exact quarter turn.
const RIGHT_ANGLE_EPSILON: f64 = 0.001;

/// Sine and cosine of a rotation given in degrees.
///
/// Quarter turns return exact 0/±1 values. Plain `to_radians().cos()` leaves
/// residue like 6e-17 at 90°, which is enough to push a `ceil` over the next
/// integer on large images.
///
/// # Returns
///
/// Tuple of (sin, cos).
pub fn rotation_trig(degrees: f64) -> (f64, f64) {
    let normalized = degrees.rem_euclid(360.0);
    let near = |target: f64| (normalized - target).abs() < RIGHT_ANGLE_EPSILON;

    if near(0.0) || near(360.0) {
        (0.0, 1.0)
    } else if near(90.0) {
        (1.0, 0.0)
    } else if near(180.0) {
        (0.0, -1.0)
    } else if near(270.0) {
        (-1.0, 0.0)
    } else {
        let rad = normalized.to_radians();
        (rad.sin(), rad.cos())
    }
}

/// Compute the dimensions of the bounding box for a rotated image.
///
/// The box is the smallest axis-aligned rectangle containing every corner
/// of the rotated image:
///
/// ```text
/// new_w = ceil(w·|cos θ| + h·|sin θ|)
/// new_h = ceil(w·|sin θ| + h·|cos θ|)
/// ```
///
/// # Arguments
///
/// * `width` - Original image width
/// * `height` - Original image height
/// * `angle_degrees` - Rotation angle in degrees
///
/// # Returns
///
/// Tuple of (new_width, new_height), never smaller than 1x1.
pub fn rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    let (sin, cos) = rotation_trig(angle_degrees);
    let (sin, cos) = (sin.abs(), cos.abs());

    let w = width as f64;
    let h = height as f64;

    let new_w = (w * cos + h * sin).ceil() as u32;
    let new_h = (w * sin + h * cos).ceil() as u32;

    (new_w.max(1), new_h.max(1))
}

/// Size in pixels of the display canvas for an image under rotation and zoom.
pub fn display_size(width: u32, height: u32, angle_degrees: f64, zoom: f64) -> (u32, u32) {
    let (bw, bh) = rotated_bounds(width, height, angle_degrees);
    let scale = |v: u32| ((v as f64) * zoom).round().max(1.0) as u32;
    (scale(bw), scale(bh))
}
