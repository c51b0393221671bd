//
// speckletool - Speckle contrast measurement for laser speckle images
// Copyright (c) 2020 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Intensity image data structure, I/O and basic operations.
//!

pub mod io;

use cgmath::Vector2;
use ndarray::Array2;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum ImageError {
    #[error("cannot decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: ::image::ImageError
    },

    #[error("unsupported pixel format of {}: {color_type}", path.display())]
    UnsupportedPixelFormat { path: PathBuf, color_type: String },

    #[error("{len} values do not form a {width}x{height} image")]
    InvalidDimensions { width: usize, height: usize, len: usize },

    #[error("invalid intensity {value} at row {row}, column {col}")]
    InvalidSample { row: usize, col: usize, value: f64 }
}

/// Single-channel intensity image.
///
/// Pixels are stored as `[row, col]`. All values are finite and non-negative.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pixels: Array2<f64>
}

impl Image {
    /// Creates an image from an intensity grid; fails on negative or non-finite samples.
    pub fn from_pixels(pixels: Array2<f64>) -> Result<Image, ImageError> {
        if let Some(((row, col), &value)) = pixels.indexed_iter().find(|(_, v)| !v.is_finite() || **v < 0.0) {
            return Err(ImageError::InvalidSample{ row, col, value });
        }

        Ok(Image{ pixels })
    }

    /// Creates an image from row-major values.
    pub fn from_vec(width: usize, height: usize, values: Vec<f64>) -> Result<Image, ImageError> {
        let len = values.len();
        let pixels = Array2::from_shape_vec((height, width), values)
            .map_err(|_| ImageError::InvalidDimensions{ width, height, len })?;

        Image::from_pixels(pixels)
    }

    /// Loads an image file, averaging colour channels into a single intensity channel.
    pub fn load(path: &Path) -> Result<Image, ImageError> {
        io::load_image(path)
    }

    pub fn width(&self) -> usize {
        self.pixels.ncols()
    }

    pub fn height(&self) -> usize {
        self.pixels.nrows()
    }

    /// Returns (height, width).
    pub fn shape(&self) -> (usize, usize) {
        self.pixels.dim()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &Array2<f64> {
        &self.pixels
    }

    /// Sum of all intensities, accumulated in row-major order.
    pub fn total_intensity(&self) -> f64 {
        self.pixels.iter().sum()
    }

    /// Calculates and returns image moments: M00, M10, M01.
    fn moments(&self) -> (f64, f64, f64) {
        let mut m00: f64 = 0.0; // sum of pixels' brightness
        let mut m10: f64 = 0.0;
        let mut m01: f64 = 0.0;

        for ((y, x), &value) in self.pixels.indexed_iter() {
            m00 += value;
            m10 += x as f64 * value;
            m01 += y as f64 * value;
        }

        (m00, m10, m01)
    }

    /// Finds the intensity-weighted centroid (x: column, y: row).
    ///
    /// Returns `None` for an empty image or one with zero total intensity.
    ///
    pub fn centroid(&self) -> Option<Vector2<f64>> {
        let (m00, m10, m01) = self.moments();

        if self.is_empty() || m00 <= 0.0 || !m00.is_finite() {
            None
        } else {
            Some(Vector2{ x: m10 / m00, y: m01 / m00 })
        }
    }
}
