//
// speckletool - Speckle contrast measurement for laser speckle images
// Copyright (c) 2020 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Radius of the region of interest around the laser spot.
//!

use cgmath::Vector2;
use crate::image::Image;
use super::{mask, roots, SpeckleError};

/// Smallest radius considered by the search.
pub const MIN_RADIUS: f64 = 1.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SolverParams {
    /// Fraction of total intensity the region of interest must enclose.
    pub cutoff: f64,
    /// Absolute tolerance of the radius (pixels).
    pub tolerance: f64,
    pub max_iterations: usize
}

impl Default for SolverParams {
    fn default() -> SolverParams {
        SolverParams {
            cutoff: 0.95,
            tolerance: 1.0e-4,
            max_iterations: 20
        }
    }
}

impl SolverParams {
    pub fn validate(&self) -> Result<(), SpeckleError> {
        if !(self.cutoff > 0.0 && self.cutoff <= 1.0) {
            return Err(SpeckleError::InvalidParameter(format!("cutoff must be in (0, 1], got {}", self.cutoff)));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(SpeckleError::InvalidParameter(format!("tolerance must be positive, got {}", self.tolerance)));
        }
        if self.max_iterations == 0 {
            return Err(SpeckleError::InvalidParameter("iteration limit must be positive".to_string()));
        }

        Ok(())
    }
}

/// Determines the batch-wide region of interest radius from a reference image.
pub trait RadiusSolver {
    fn solve_radius(&self, image: &Image) -> Result<f64, SpeckleError>;
}

impl RadiusSolver for SolverParams {
    fn solve_radius(&self, image: &Image) -> Result<f64, SpeckleError> {
        solve_radius(image, self)
    }
}

/// Enclosed intensity fraction minus cutoff, as a function of radius around the image's centroid.
pub struct MaskError<'a> {
    image: &'a Image,
    center: Vector2<f64>,
    total_intensity: f64,
    cutoff: f64
}

impl<'a> MaskError<'a> {
    pub fn new(image: &'a Image, cutoff: f64) -> Result<MaskError<'a>, SpeckleError> {
        if image.is_empty() {
            return Err(SpeckleError::DegenerateImage("image has no pixels".to_string()));
        }
        let center = image.centroid().ok_or_else(||
            SpeckleError::DegenerateImage("total intensity is zero".to_string())
        )?;

        Ok(MaskError{ image, center, total_intensity: image.total_intensity(), cutoff })
    }

    pub fn center(&self) -> Vector2<f64> { self.center }

    pub fn eval(&self, radius: f64) -> f64 {
        mask::enclosed_intensity(self.image, self.center, radius) / self.total_intensity - self.cutoff
    }

    /// Same as `eval` for the radius whose square is `sqr_radius`.
    fn eval_sqr(&self, sqr_radius: f64) -> f64 {
        mask::enclosed_intensity_sqr(self.image, self.center, sqr_radius) / self.total_intensity - self.cutoff
    }

    /// Returns squared radii in (`lower`^2, `upper`^2] at which the enclosed intensity changes; ascending, no duplicates.
    fn steps(&self, lower: f64, upper: f64) -> Vec<f64> {
        let (min_sqr, max_sqr) = (lower * lower, upper * upper);

        let mut steps: Vec<f64> = self.image.pixels().indexed_iter()
            .filter(|(_, value)| **value > 0.0)
            .map(|((row, col), _)| mask::sqr_dist(row, col, &self.center))
            .filter(|&d2| d2 > min_sqr && d2 <= max_sqr)
            .collect();
        steps.sort_unstable_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));
        steps.dedup();

        steps
    }

    /// Returns a radius enclosing all pixels: distance from the center to the farthest pixel, plus half a pixel.
    pub fn full_coverage_radius(&self) -> f64 {
        let max_x = (self.image.width() - 1) as f64;
        let max_y = (self.image.height() - 1) as f64;

        let dx = self.center.x.max(max_x - self.center.x);
        let dy = self.center.y.max(max_y - self.center.y);

        (dx * dx + dy * dy).sqrt() + 0.5
    }
}

/// Returns the smallest radius whose square is not less than `sqr_radius`.
fn radius_enclosing(sqr_radius: f64) -> f64 {
    let mut radius = sqr_radius.sqrt();
    while radius * radius < sqr_radius {
        radius += radius * f64::EPSILON;
    }

    radius
}

/// Returns a radius enclosing the step `k`, at most `tolerance` / 2 beyond it and short of the next step.
fn radius_past_step(steps: &[f64], k: usize, tolerance: f64) -> f64 {
    let radius = radius_enclosing(steps[k]);
    let margin = match steps.get(k + 1) {
        Some(&next) => (0.5 * tolerance).min(0.5 * (next.sqrt() - radius)),
        None => 0.5 * tolerance
    };

    radius + margin.max(0.0)
}

/// Finds the radius of the disk around the image's centroid which encloses `params.cutoff` of total intensity.
///
/// The search interval is [`MIN_RADIUS`, max(width, height) / 2]. If the upper bound does not enclose enough
/// intensity (e.g. several bright spots far from the centroid), it is widened once to cover the whole image.
///
/// The enclosed intensity changes only at distances of pixels from the centroid, so the root is bracketed over
/// the ascending list of these distances. The result lies within `params.tolerance` above the distance of the first
/// pixel which brings the enclosed fraction to the cutoff, and does not reach the next pixel distance.
///
pub fn solve_radius(image: &Image, params: &SolverParams) -> Result<f64, SpeckleError> {
    params.validate()?;

    let mask_error = MaskError::new(image, params.cutoff)?;
    log::debug!("intensity centroid: ({:.2}, {:.2})", mask_error.center().x, mask_error.center().y);

    let lower = MIN_RADIUS;
    let error_at_lower = mask_error.eval(lower);
    if error_at_lower == 0.0 {
        return Ok(lower);
    } else if error_at_lower > 0.0 {
        return Err(SpeckleError::NoRootFound(format!(
            "{:.2}% of intensity already enclosed at radius {}",
            (error_at_lower + params.cutoff) * 100.0, lower
        )));
    }

    let mut upper = image.width().max(image.height()) as f64 / 2.0;
    if upper <= lower || mask_error.eval(upper) < 0.0 {
        let widened = mask_error.full_coverage_radius();
        log::debug!("search bound {} does not enclose the cutoff intensity; widening to {:.2}", upper, widened);
        upper = widened;

        if upper <= lower || mask_error.eval(upper) < 0.0 {
            return Err(SpeckleError::NoRootFound(format!(
                "cutoff {} not reached within radius {:.2}", params.cutoff, upper
            )));
        }
    }

    let steps = mask_error.steps(lower, upper);
    log::debug!("{} intensity steps between radii {} and {:.2}", steps.len(), lower, upper);
    if steps.is_empty() {
        return Err(SpeckleError::NoRootFound(format!("no intensity between radii {} and {:.2}", lower, upper)));
    }

    let last = steps.len() - 1;
    let index = |t: f64| (t.ceil().max(0.0) as usize).min(last);
    let step_at = |t: f64| steps[index(t)];

    let radius = if last == 0 || mask_error.eval_sqr(steps[0]) >= 0.0 {
        radius_past_step(&steps, 0, params.tolerance)
    } else {
        // bracket of step indices; a bracket at most 1 wide holds the first step reaching the cutoff at its end
        let bracket = roots::bracket_root(
            |t| mask_error.eval_sqr(step_at(t)),
            0.0,
            last as f64,
            0.5,
            params.max_iterations,
            |a, b| radius_enclosing(step_at(b)) - radius_enclosing(step_at(a)) <= 0.5 * params.tolerance
        )?;

        radius_past_step(&steps, index(bracket.b), params.tolerance)
    };

    log::debug!("region of interest radius: {:.4}", radius);

    Ok(radius)
}
