//
// speckletool - Speckle contrast measurement for laser speckle images
// Copyright (c) 2020 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Speckle contrast calculation.
//!

use crate::image::Image;
use ndarray::Zip;
use super::{mask, SpeckleError};

/// Returns the speckle contrast (population standard deviation / mean) within `radius` of the image's centroid.
pub fn speckle_contrast(image: &Image, radius: f64) -> Result<f64, SpeckleError> {
    mask::check_radius(radius)?;

    let center = image.centroid().ok_or_else(||
        SpeckleError::DegenerateImage("total intensity is zero, centroid undefined".to_string())
    )?;
    let mask = mask::circular_mask(image.shape(), center, radius)?;

    let (count, sum) = Zip::from(image.pixels()).and(&mask).fold((0usize, 0.0), |(count, sum), &value, &inside| {
        if inside { (count + 1, sum + value) } else { (count, sum) }
    });

    if count == 0 {
        return Err(SpeckleError::DegenerateImage(format!(
            "no pixels within radius {} of centroid ({:.2}, {:.2})", radius, center.x, center.y
        )));
    }

    let mean = sum / count as f64;
    if mean == 0.0 {
        return Err(SpeckleError::DegenerateImage("mean intensity within mask is zero".to_string()));
    }

    let sum_sq_diffs = Zip::from(image.pixels()).and(&mask).fold(0.0, |acc, &value, &inside| {
        if inside { acc + (value - mean).powi(2) } else { acc }
    });
    let std_dev = (sum_sq_diffs / count as f64).sqrt();

    Ok(std_dev / mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// 5x5 image of ones with a spike of 100 in the middle.
    fn spike_image() -> Image {
        let mut values = vec![1.0; 25];
        values[2 * 5 + 2] = 100.0;
        Image::from_vec(5, 5, values).unwrap()
    }

    #[test]
    fn spike_contrast_within_unit_radius() {
        // selected: 100, 1, 1, 1, 1; mean = 20.8, std. dev. = 39.6
        let contrast = speckle_contrast(&spike_image(), 1.0).unwrap();
        assert_abs_diff_eq!(contrast, 99.0 / 52.0, epsilon = 1.0e-12);
    }

    #[test]
    fn uniform_region_has_zero_contrast() {
        let image = Image::from_vec(9, 9, vec![3.0; 81]).unwrap();
        assert_abs_diff_eq!(speckle_contrast(&image, 3.0).unwrap(), 0.0);
    }

    #[test]
    fn contrast_uses_own_centroid() {
        // identical spot at two positions yields identical contrast
        let mut values1 = vec![0.0; 20 * 20];
        let mut values2 = vec![0.0; 20 * 20];
        for (i, &(row, col)) in [(0, 0), (0, 1), (1, 0), (1, 1), (2, 1)].iter().enumerate() {
            values1[(5 + row) * 20 + 5 + col] = 10.0 + i as f64;
            values2[(12 + row) * 20 + 9 + col] = 10.0 + i as f64;
        }
        let image1 = Image::from_vec(20, 20, values1).unwrap();
        let image2 = Image::from_vec(20, 20, values2).unwrap();

        let c1 = speckle_contrast(&image1, 2.5).unwrap();
        let c2 = speckle_contrast(&image2, 2.5).unwrap();
        assert!(c1 > 0.0);
        assert_abs_diff_eq!(c1, c2, epsilon = 1.0e-12);
    }

    #[test]
    fn when_zero_intensity_fail() {
        let image = Image::from_vec(5, 5, vec![0.0; 25]).unwrap();
        assert!(matches!(speckle_contrast(&image, 2.0), Err(SpeckleError::DegenerateImage(_))));
    }

    #[test]
    fn when_no_pixels_within_radius_fail() {
        // centroid at (0.5, 0.5), nearest pixels are ~0.71 away
        let image = Image::from_vec(2, 2, vec![1.0; 4]).unwrap();
        assert!(matches!(speckle_contrast(&image, 0.5), Err(SpeckleError::DegenerateImage(_))));
    }

    #[test]
    fn when_masked_mean_is_zero_fail() {
        // bright pixels on the corners, centroid in the dark middle
        let mut values = vec![0.0; 9 * 9];
        values[0] = 1.0;
        values[8] = 1.0;
        values[72] = 1.0;
        values[80] = 1.0;
        let image = Image::from_vec(9, 9, values).unwrap();
        assert!(matches!(speckle_contrast(&image, 2.0), Err(SpeckleError::DegenerateImage(_))));
    }

    #[test]
    fn when_radius_invalid_fail() {
        for &radius in &[0.0, -2.0, f64::NAN] {
            assert!(matches!(speckle_contrast(&spike_image(), radius), Err(SpeckleError::InvalidGeometry(_))));
        }
    }
}
