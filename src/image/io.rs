//
// speckletool - Speckle contrast measurement for laser speckle images
// Copyright (c) 2020 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Image file decoding.
//!

use super::{Image, ImageError};
use ::image::DynamicImage;
use num_traits::ToPrimitive;
use std::path::Path;

/// Decodes an image file into a single-channel intensity image.
///
/// Supported are 8- and 16-bit mono and colour images and 32-bit floating-point colour images.
/// For colour images the R, G, B planes are averaged; alpha is ignored.
///
pub fn load_image(path: &Path) -> Result<Image, ImageError> {
    let decoded = ::image::open(path)
        .map_err(|source| ImageError::Decode{ path: path.to_path_buf(), source })?;

    let color_type = decoded.color();
    let (width, height) = (decoded.width() as usize, decoded.height() as usize);
    match to_intensity(decoded) {
        Some(values) => Image::from_vec(width, height, values),
        None => Err(ImageError::UnsupportedPixelFormat{
            path: path.to_path_buf(),
            color_type: format!("{:?}", color_type)
        })
    }
}

/// Returns row-major intensities or `None` if the pixel format is not supported.
fn to_intensity(image: DynamicImage) -> Option<Vec<f64>> {
    let values = match image {
        DynamicImage::ImageLuma8(buf)   => average_channels(buf.as_raw(), 1, 1),
        DynamicImage::ImageLumaA8(buf)  => average_channels(buf.as_raw(), 2, 1),
        DynamicImage::ImageRgb8(buf)    => average_channels(buf.as_raw(), 3, 3),
        DynamicImage::ImageRgba8(buf)   => average_channels(buf.as_raw(), 4, 3),
        DynamicImage::ImageLuma16(buf)  => average_channels(buf.as_raw(), 1, 1),
        DynamicImage::ImageLumaA16(buf) => average_channels(buf.as_raw(), 2, 1),
        DynamicImage::ImageRgb16(buf)   => average_channels(buf.as_raw(), 3, 3),
        DynamicImage::ImageRgba16(buf)  => average_channels(buf.as_raw(), 4, 3),
        DynamicImage::ImageRgb32F(buf)  => average_channels(buf.as_raw(), 3, 3),
        DynamicImage::ImageRgba32F(buf) => average_channels(buf.as_raw(), 4, 3),
        _ => return None
    };

    Some(values)
}

/// Converts interleaved samples to intensities.
///
/// # Parameters
///
/// * `values_per_pixel` - Number of interleaved channels.
/// * `color_channels` - Number of leading channels to average (the rest, e.g. alpha, is skipped).
///
fn average_channels<T: ToPrimitive + Copy>(values: &[T], values_per_pixel: usize, color_channels: usize) -> Vec<f64> {
    values.chunks_exact(values_per_pixel).map(|pixel| {
        let sum: f64 = pixel[..color_channels].iter().map(|v| v.to_f64().unwrap_or(0.0)).sum();
        sum / color_channels as f64
    }).collect()
}
