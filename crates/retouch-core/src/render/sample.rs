//! Pixel sampling in continuous image coordinates.
//!
//! Coordinates follow the canvas convention: pixel `(i, j)` covers
//! `[i, i+1) × [j, j+1)` and its centre sits at `(i + 0.5, j + 0.5)`.
//! Points inside `[0, w] × [0, h]` clamp to the nearest edge pixel, points
//! outside sample as fully transparent.

use crate::decode::ImageAsset;

const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Lanczos kernel support.
const LANCZOS_A: f64 = 3.0;

#[inline]
fn outside(image: &ImageAsset, x: f64, y: f64) -> bool {
    !(0.0..=image.width as f64).contains(&x) || !(0.0..=image.height as f64).contains(&y)
}

/// Get a pixel as [f64; 4], clamping the coordinates to the image edges.
#[inline]
fn get_pixel_clamped(image: &ImageAsset, px: i64, py: i64) -> [f64; 4] {
    let x = px.clamp(0, image.width as i64 - 1) as usize;
    let y = py.clamp(0, image.height as i64 - 1) as usize;
    let idx = (y * image.width as usize + x) * 4;
    [
        image.pixels[idx] as f64,
        image.pixels[idx + 1] as f64,
        image.pixels[idx + 2] as f64,
        image.pixels[idx + 3] as f64,
    ]
}

/// Sample a pixel using bilinear interpolation.
///
/// Bilinear interpolation considers the 4 nearest pixel centres and weights
/// their contribution based on distance. Sampling exactly on a pixel centre
/// returns that pixel unchanged.
pub fn sample_bilinear(image: &ImageAsset, x: f64, y: f64) -> [u8; 4] {
    if image.is_empty() || outside(image, x, y) {
        return TRANSPARENT;
    }

    // Shift from pixel-area coordinates to pixel-centre coordinates
    let cx = x - 0.5;
    let cy = y - 0.5;
    let x0 = cx.floor();
    let y0 = cy.floor();
    let fx = cx - x0;
    let fy = cy - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let p00 = get_pixel_clamped(image, x0, y0);
    let p10 = get_pixel_clamped(image, x0 + 1, y0);
    let p01 = get_pixel_clamped(image, x0, y0 + 1);
    let p11 = get_pixel_clamped(image, x0 + 1, y0 + 1);

    let mut result = [0u8; 4];
    for (i, out) in result.iter_mut().enumerate() {
        let v = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
        *out = v.clamp(0.0, 255.0).round() as u8;
    }
    result
}

/// Sample a pixel using Lanczos3 interpolation.
///
/// Lanczos3 considers a 6x6 neighbourhood of pixels, providing higher
/// quality results especially for sharp edges. Neighbours beyond the image
/// border repeat the edge pixel.
pub fn sample_lanczos3(image: &ImageAsset, x: f64, y: f64) -> [u8; 4] {
    if image.is_empty() || outside(image, x, y) {
        return TRANSPARENT;
    }

    let cx = x - 0.5;
    let cy = y - 0.5;
    let x0 = cx.floor() as i64;
    let y0 = cy.floor() as i64;

    let mut sum = [0.0f64; 4];
    let mut weight_sum = 0.0;

    for ky in -2..=3 {
        let py = y0 + ky;
        let wy = lanczos_weight(cy - py as f64, LANCZOS_A);
        if wy == 0.0 {
            continue;
        }
        for kx in -2..=3 {
            let px = x0 + kx;
            let weight = lanczos_weight(cx - px as f64, LANCZOS_A) * wy;
            if weight == 0.0 {
                continue;
            }

            let pixel = get_pixel_clamped(image, px, py);
            for (acc, v) in sum.iter_mut().zip(pixel) {
                *acc += v * weight;
            }
            weight_sum += weight;
        }
    }

    let mut result = [0u8; 4];
    if weight_sum.abs() > f64::EPSILON {
        for (out, acc) in result.iter_mut().zip(sum) {
            *out = (acc / weight_sum).clamp(0.0, 255.0).round() as u8;
        }
    }
    result
}

/// Lanczos kernel weight function.
///
/// ```text
/// L(x) = sinc(x) * sinc(x/a)  for |x| < a
/// L(x) = 0                     for |x| >= a
/// ```
///
/// where sinc(x) = sin(πx) / (πx)
pub(crate) fn lanczos_weight(x: f64, a: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }

    let pi_x = std::f64::consts::PI * x;
    let pi_x_a = pi_x / a;
    (a * pi_x.sin() * pi_x_a.sin()) / (pi_x * pi_x)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2x2 image: red, green / blue, white
    fn quad() -> ImageAsset {
        ImageAsset::new(
            2,
            2,
            vec![
                255, 0, 0, 255, 0, 255, 0, 255, //
                0, 0, 255, 255, 255, 255, 255, 255,
            ],
        )
    }

    #[test]
    fn test_bilinear_exact_on_pixel_centres() {
        let img = quad();
        assert_eq!(sample_bilinear(&img, 0.5, 0.5), [255, 0, 0, 255]);
        assert_eq!(sample_bilinear(&img, 1.5, 0.5), [0, 255, 0, 255]);
        assert_eq!(sample_bilinear(&img, 0.5, 1.5), [0, 0, 255, 255]);
        assert_eq!(sample_bilinear(&img, 1.5, 1.5), [255, 255, 255, 255]);
    }

    #[test]
    fn test_bilinear_midpoint_blends() {
        let img = quad();
        let p = sample_bilinear(&img, 1.0, 0.5);
        assert_eq!(p, [128, 128, 0, 255]);
    }

    #[test]
    fn test_bilinear_clamps_at_edges() {
        let img = quad();
        assert_eq!(sample_bilinear(&img, 0.0, 0.0), [255, 0, 0, 255]);
        assert_eq!(sample_bilinear(&img, 2.0, 2.0), [255, 255, 255, 255]);
    }

    #[test]
    fn test_outside_is_transparent() {
        let img = quad();
        assert_eq!(sample_bilinear(&img, -0.1, 1.0), TRANSPARENT);
        assert_eq!(sample_bilinear(&img, 1.0, 2.1), TRANSPARENT);
        assert_eq!(sample_lanczos3(&img, 3.0, 1.0), TRANSPARENT);
    }

    #[test]
    fn test_empty_image_is_transparent() {
        let img = ImageAsset::new(0, 0, vec![]);
        assert_eq!(sample_bilinear(&img, 0.0, 0.0), TRANSPARENT);
        assert_eq!(sample_lanczos3(&img, 0.0, 0.0), TRANSPARENT);
    }

    #[test]
    fn test_lanczos_exact_on_pixel_centres() {
        let pixels: Vec<u8> = (0..64u8).flat_map(|v| [v * 4, 255 - v * 4, v, 255]).collect();
        let img = ImageAsset::new(8, 8, pixels);
        for (x, y) in [(0u32, 0u32), (3, 4), (7, 7)] {
            let sampled = sample_lanczos3(&img, x as f64 + 0.5, y as f64 + 0.5);
            assert_eq!(sampled, img.pixel(x, y));
        }
    }

    #[test]
    fn test_lanczos_uniform_stays_uniform() {
        let img = ImageAsset::new(6, 6, [40u8, 90, 200, 255].repeat(36));
        assert_eq!(sample_lanczos3(&img, 2.3, 4.9), [40, 90, 200, 255]);
    }

    #[test]
    fn test_lanczos_weight_at_zero() {
        assert!((lanczos_weight(0.0, 3.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_lanczos_weight_at_boundary() {
        assert!(lanczos_weight(3.0, 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_lanczos_weight_symmetry() {
        assert!((lanczos_weight(1.5, 3.0) - lanczos_weight(-1.5, 3.0)).abs() < 1e-10);
    }
}
