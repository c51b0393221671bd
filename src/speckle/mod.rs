//
// speckletool - Speckle contrast measurement for laser speckle images
// Copyright (c) 2020 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Speckle analysis: circular masks, region-of-interest radius and speckle contrast.
//!

mod contrast;
mod mask;
mod radius;
pub mod roots;

pub use contrast::speckle_contrast;
pub use radius::{RadiusSolver, SolverParams};

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum SpeckleError {
    /// Bad shape, radius or center given to masking.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Zero total intensity, empty image or empty masked region.
    #[error("degenerate image: {0}")]
    DegenerateImage(String),

    /// Root-finding bracket invalid or iteration budget exhausted.
    #[error("no root found: {0}")]
    NoRootFound(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String)
}

impl From<roots::RootError> for SpeckleError {
    fn from(err: roots::RootError) -> SpeckleError {
        SpeckleError::NoRootFound(err.to_string())
    }
}
