//
// speckletool - Speckle contrast measurement for laser speckle images
// Copyright (c) 2020 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Circular pixel masks.
//!

use cgmath::Vector2;
use crate::image::Image;
use ndarray::{s, Array2};
use super::SpeckleError;

/// Pixel selection with the same shape (rows, columns) as its source image.
pub type Mask = Array2<bool>;

pub(super) fn sqr_dist(row: usize, col: usize, center: &Vector2<f64>) -> f64 {
    (row as f64 - center.y).powi(2) + (col as f64 - center.x).powi(2)
}

pub(super) fn check_radius(radius: f64) -> Result<(), SpeckleError> {
    if radius.is_finite() && radius > 0.0 {
        Ok(())
    } else {
        Err(SpeckleError::InvalidGeometry(format!("radius must be positive and finite, got {}", radius)))
    }
}

/// Selects pixels (i, j) for which (i - center.y)^2 + (j - center.x)^2 <= radius^2.
///
/// # Parameters
///
/// * `shape` - Image (height, width).
/// * `center` - Mask center; x: column, y: row.
/// * `radius` - Mask radius in pixels; must be positive.
///
pub fn circular_mask(shape: (usize, usize), center: Vector2<f64>, radius: f64) -> Result<Mask, SpeckleError> {
    let (height, width) = shape;
    if height == 0 || width == 0 {
        return Err(SpeckleError::InvalidGeometry(format!("empty image shape {}x{}", width, height)));
    }
    check_radius(radius)?;
    if !center.x.is_finite() || !center.y.is_finite() {
        return Err(SpeckleError::InvalidGeometry(format!("non-finite center ({}, {})", center.x, center.y)));
    }

    let r2 = radius * radius;

    Ok(Array2::from_shape_fn(shape, |(row, col)| sqr_dist(row, col, &center) <= r2))
}

/// Returns indices which may lie within `radius` of `c` (with slack on each side).
fn candidate_range(c: f64, radius: f64, len: usize) -> (usize, usize) {
    let lo = ((c - radius).floor() - 1.0).max(0.0);
    let hi = ((c + radius).ceil() + 2.0).min(len as f64);

    if lo < hi { (lo as usize, hi as usize) } else { (0, 0) }
}

/// Sums intensities of pixels selected by a circular mask, without creating the mask.
///
/// Uses the same inclusion test as `circular_mask`, but also accepts `radius` = 0 (selects at most
/// the pixel `center` falls on). Negative or NaN radii select nothing.
///
pub fn enclosed_intensity(image: &Image, center: Vector2<f64>, radius: f64) -> f64 {
    if !(radius >= 0.0) {
        return 0.0;
    }

    enclosed_intensity_sqr(image, center, radius * radius)
}

/// Sums intensities of pixels whose squared distance from `center` does not exceed `sqr_radius`.
///
/// Pixels are summed in row-major order, so equal selections give identical sums.
///
pub(super) fn enclosed_intensity_sqr(image: &Image, center: Vector2<f64>, sqr_radius: f64) -> f64 {
    if image.is_empty() || !(sqr_radius >= 0.0) {
        return 0.0;
    }

    let radius = sqr_radius.sqrt();
    let (rows_lo, rows_hi) = candidate_range(center.y, radius, image.height());
    let (cols_lo, cols_hi) = candidate_range(center.x, radius, image.width());

    image.pixels()
        .slice(s![rows_lo..rows_hi, cols_lo..cols_hi])
        .indexed_iter()
        .fold(0.0, |sum, ((y, x), &value)| {
            if sqr_dist(rows_lo + y, cols_lo + x, &center) <= sqr_radius { sum + value } else { sum }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(mask: &Mask) -> usize {
        mask.iter().filter(|m| **m).count()
    }

    #[test]
    fn radius_covering_image_selects_all() {
        let mask = circular_mask((5, 7), Vector2{ x: 3.0, y: 2.0 }, 10.0).unwrap();
        assert_eq!((5, 7), mask.dim());
        assert!(mask.iter().all(|m| *m));
    }

    #[test]
    fn unit_radius_selects_cross() {
        let mask = circular_mask((5, 5), Vector2{ x: 2.0, y: 2.0 }, 1.0).unwrap();
        assert_eq!(5, count(&mask));
        for &(row, col) in &[(2, 2), (1, 2), (3, 2), (2, 1), (2, 3)] {
            assert!(mask[[row, col]]);
        }
        assert!(!mask[[1, 1]]);
    }

    #[test]
    fn boundary_is_inclusive() {
        // (0, 0) is exactly 5 away from (row 3, col 4)
        let mask = circular_mask((4, 5), Vector2{ x: 4.0, y: 3.0 }, 5.0).unwrap();
        assert!(mask[[0, 0]]);
        let mask = circular_mask((4, 5), Vector2{ x: 4.0, y: 3.0 }, 4.999).unwrap();
        assert!(!mask[[0, 0]]);
    }

    #[test]
    fn uses_rows_for_y_and_columns_for_x() {
        let mask = circular_mask((3, 10), Vector2{ x: 8.0, y: 1.0 }, 1.0).unwrap();
        assert!(mask[[1, 8]]);
        assert!(mask[[1, 9]]);
        assert!(!mask[[1, 2]]);
    }

    #[test]
    fn center_outside_image_is_accepted() {
        let mask = circular_mask((4, 4), Vector2{ x: -1.0, y: 0.0 }, 1.0).unwrap();
        assert_eq!(1, count(&mask));
        assert!(mask[[0, 0]]);
    }

    #[test]
    fn when_radius_not_positive_fail() {
        for &radius in &[0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                circular_mask((3, 3), Vector2{ x: 1.0, y: 1.0 }, radius),
                Err(SpeckleError::InvalidGeometry(_))
            ));
        }
    }

    #[test]
    fn when_shape_empty_fail() {
        assert!(matches!(
            circular_mask((0, 3), Vector2{ x: 1.0, y: 1.0 }, 1.0),
            Err(SpeckleError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn when_center_not_finite_fail() {
        assert!(circular_mask((3, 3), Vector2{ x: f64::NAN, y: 1.0 }, 1.0).is_err());
    }

    #[test]
    fn enclosed_intensity_matches_mask() {
        let values: Vec<f64> = (0..9 * 11).map(|i| (i % 7) as f64).collect();
        let image = Image::from_vec(11, 9, values).unwrap();
        let center = Vector2{ x: 6.3, y: 3.7 };

        for &radius in &[0.5, 1.0, 2.2, 3.0, 4.9, 8.0, 20.0] {
            let mask = circular_mask(image.shape(), center, radius).unwrap();
            let expected: f64 = image.pixels().iter().zip(mask.iter())
                .filter(|(_, m)| **m)
                .map(|(v, _)| *v)
                .sum();
            assert_eq!(expected, enclosed_intensity(&image, center, radius));
        }
    }

    #[test]
    fn zero_radius_selects_at_most_center_pixel() {
        let image = Image::from_vec(3, 3, vec![1.0; 9]).unwrap();
        assert_eq!(1.0, enclosed_intensity(&image, Vector2{ x: 1.0, y: 1.0 }, 0.0));
        assert_eq!(0.0, enclosed_intensity(&image, Vector2{ x: 1.5, y: 1.0 }, 0.0));
    }

    #[test]
    fn full_coverage_equals_total_intensity() {
        let values: Vec<f64> = (0..6 * 8).map(|i| 0.1 * i as f64).collect();
        let image = Image::from_vec(8, 6, values).unwrap();
        assert_eq!(image.total_intensity(), enclosed_intensity(&image, Vector2{ x: 3.5, y: 2.5 }, 100.0));
    }
}
