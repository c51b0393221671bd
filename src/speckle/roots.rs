//
// speckletool - Speckle contrast measurement for laser speckle images
// Copyright (c) 2020 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Bracketed root finding.
//!

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum RootError {
    #[error("invalid search interval [{a}, {b}] with tolerance {tolerance}")]
    InvalidInterval { a: f64, b: f64, tolerance: f64 },

    #[error("f({a}) = {fa} and f({b}) = {fb} do not bracket a root")]
    InvalidBracket { a: f64, b: f64, fa: f64, fb: f64 },

    #[error("no convergence after {iterations} iterations (bracket [{a}, {b}])")]
    NotConverged { iterations: usize, a: f64, b: f64 },

    #[error("f({x}) is not a number")]
    NotANumber { x: f64 }
}

/// Interval [`a`, `b`] over which the function changes sign; `a` == `b` is an exact root.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bracket {
    pub a: f64,
    pub b: f64
}

/// Narrows a bracket of a root of `f` in [`a`, `b`] using the ITP (interpolate, truncate, project) method.
///
/// `f(a)` and `f(b)` must have opposite signs (or one of them must be zero). `f` need not be
/// continuous: for a monotonic step function the final bracket contains the step. Every iteration
/// keeps a sign-changing bracket and at most `ceil(log2((b - a) / (2 * tolerance))) + 1` iterations
/// are needed.
///
/// # Parameters
///
/// * `tolerance` - Narrowing stops once the bracket is at most 2 * `tolerance` wide.
/// * `max_iterations` - Fails with `RootError::NotConverged` when exceeded.
/// * `is_resolved` - Called with each bracket; narrowing also stops when it returns true.
///
pub fn bracket_root<F, R>(
    mut f: F,
    a: f64,
    b: f64,
    tolerance: f64,
    max_iterations: usize,
    mut is_resolved: R
) -> Result<Bracket, RootError>
where F: FnMut(f64) -> f64,
      R: FnMut(f64, f64) -> bool
{
    if !(a.is_finite() && b.is_finite() && a < b && tolerance.is_finite() && tolerance > 0.0) {
        return Err(RootError::InvalidInterval{ a, b, tolerance });
    }

    let fa = f(a);
    let fb = f(b);
    if fa.is_nan() { return Err(RootError::NotANumber{ x: a }); }
    if fb.is_nan() { return Err(RootError::NotANumber{ x: b }); }

    if fa == 0.0 { return Ok(Bracket{ a, b: a }); }
    if fb == 0.0 { return Ok(Bracket{ a: b, b }); }
    if fa.signum() == fb.signum() {
        return Err(RootError::InvalidBracket{ a, b, fa, fb });
    }

    // work with a function that is negative at `a` and positive at `b`
    let sign = if fa < 0.0 { 1.0 } else { -1.0 };
    let (mut a, mut b) = (a, b);
    let (mut ya, mut yb) = (sign * fa, sign * fb);

    // truncation parameters (kappa2 = 2) and slack over bisection
    let kappa1 = 0.2 / (b - a);
    const N0: i32 = 1;

    let n_half = ((b - a) / (2.0 * tolerance)).log2().ceil().max(0.0) as i32;
    let n_max = n_half + N0;

    let mut iterations = 0;
    while b - a > 2.0 * tolerance && !is_resolved(a, b) {
        if iterations >= max_iterations {
            return Err(RootError::NotConverged{ iterations, a, b });
        }

        let x_half = 0.5 * (a + b);
        let r = (tolerance * 2.0f64.powi(n_max - iterations as i32) - 0.5 * (b - a)).max(0.0);
        let delta = kappa1 * (b - a).powi(2);

        // interpolation (regula falsi)
        let x_f = (yb * a - ya * b) / (yb - ya);

        // truncation
        let sigma = (x_half - x_f).signum();
        let x_t = if delta <= (x_half - x_f).abs() { x_f + sigma * delta } else { x_half };

        // projection onto the minmax interval
        let x_itp = if (x_t - x_half).abs() <= r { x_t } else { x_half - sigma * r };

        let y_itp = f(x_itp);
        if y_itp.is_nan() {
            return Err(RootError::NotANumber{ x: x_itp });
        }
        let y_itp = sign * y_itp;

        if y_itp > 0.0 {
            b = x_itp;
            yb = y_itp;
        } else if y_itp < 0.0 {
            a = x_itp;
            ya = y_itp;
        } else {
            return Ok(Bracket{ a: x_itp, b: x_itp });
        }

        iterations += 1;
    }

    Ok(Bracket{ a, b })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Midpoint of the final bracket.
    fn find_root<F: FnMut(f64) -> f64>(f: F, a: f64, b: f64, tolerance: f64, max_iterations: usize) -> Result<f64, RootError> {
        bracket_root(f, a, b, tolerance, max_iterations, |_, _| false).map(|br| 0.5 * (br.a + br.b))
    }

    #[test]
    fn finds_root_of_smooth_function() {
        let root = find_root(|x| x * x - 2.0, 0.0, 2.0, 1.0e-9, 50).unwrap();
        assert_abs_diff_eq!(root, 2.0f64.sqrt(), epsilon = 1.0e-9);
    }

    #[test]
    fn finds_root_of_decreasing_function() {
        let root = find_root(|x: f64| x.cos(), 0.0, 3.0, 1.0e-8, 50).unwrap();
        assert_abs_diff_eq!(root, std::f64::consts::FRAC_PI_2, epsilon = 1.0e-8);
    }

    #[test]
    fn finds_step_of_step_function_within_bisection_budget() {
        let step = 0.3141592;
        let tolerance = 1.0e-4;
        let mut evaluations = 0;
        let root = find_root(
            |x| { evaluations += 1; if x >= step { 1.0 } else { -1.0 } },
            0.0, 1.0, tolerance, 100
        ).unwrap();

        assert!((root - step).abs() <= tolerance);
        // 2 bracket evaluations + ceil(log2(1 / 2e-4)) + 1
        assert!(evaluations <= 2 + 13 + 1);
    }

    #[test]
    fn zero_at_bound_is_returned() {
        assert_eq!(Ok(1.0), find_root(|x| x - 1.0, 1.0, 4.0, 1.0e-6, 10));
        assert_eq!(Ok(4.0), find_root(|x| x - 4.0, 1.0, 4.0, 1.0e-6, 10));
    }

    #[test]
    fn when_bracket_has_no_sign_change_fail() {
        let result = find_root(|x| x * x + 1.0, -1.0, 1.0, 1.0e-6, 10);
        assert!(matches!(result, Err(RootError::InvalidBracket{ .. })));
    }

    #[test]
    fn when_iterations_exhausted_fail() {
        let result = find_root(|x| x - 0.123456789, 0.0, 1000.0, 1.0e-9, 3);
        assert!(matches!(result, Err(RootError::NotConverged{ iterations: 3, .. })));
    }

    #[test]
    fn when_function_returns_nan_fail() {
        let result = find_root(|x| if x > 0.5 { f64::NAN } else { x - 1.0 }, 0.0, 1.0, 1.0e-6, 10);
        assert!(matches!(result, Err(RootError::NotANumber{ x }) if x == 1.0));
    }

    #[test]
    fn when_interval_invalid_fail() {
        for &(a, b, tolerance) in &[(1.0, 1.0, 1.0e-6), (2.0, 1.0, 1.0e-6), (0.0, 1.0, 0.0), (0.0, f64::NAN, 1.0e-6)] {
            let result = bracket_root(|x| x - 0.5, a, b, tolerance, 10, |_, _| false);
            assert!(matches!(result, Err(RootError::InvalidInterval{ .. })));
        }
    }

    #[test]
    fn narrowing_stops_when_resolved() {
        let mut calls = 0;
        let bracket = bracket_root(
            |x| x - 0.3, 0.0, 1.0, 1.0e-12, 3,
            |a, b| { calls += 1; b - a <= 0.6 }
        ).unwrap();

        assert!(bracket.b - bracket.a <= 0.6);
        assert!(bracket.a <= 0.3 && 0.3 <= bracket.b);
        assert!(calls >= 2);
    }
}
