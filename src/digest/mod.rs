//
// speckletool - Speckle contrast measurement for laser speckle images
// Copyright (c) 2020 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Batch processing: speckle contrast of a sequence of images.
//!

pub mod sink;

use chrono::{DateTime, Local};
use crate::image::{Image, ImageError};
use crate::speckle::{self, RadiusSolver, SpeckleError};
use rayon::prelude::*;
use sink::{LogError, LogSink};
use std::path::{Path, PathBuf};

/// Provides decoded images.
pub trait ImageSource {
    fn load(&self, path: &Path) -> Result<Image, ImageError>;
}

/// Decodes images from files.
pub struct FileImageSource;

impl ImageSource for FileImageSource {
    fn load(&self, path: &Path) -> Result<Image, ImageError> {
        Image::load(path)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContrastResult {
    /// Base name of the image file.
    pub file_name: String,
    pub contrast: f64,
    pub timestamp: DateTime<Local>
}

/// Processing stage at which an image failed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Stage {
    Decoding,
    RadiusDerivation,
    ContrastComputation
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", match self {
            Stage::Decoding            => "decoding",
            Stage::RadiusDerivation    => "radius derivation",
            Stage::ContrastComputation => "contrast computation"
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Speckle(#[from] SpeckleError)
}

/// Failure of a single image.
#[derive(thiserror::Error, Debug)]
#[error("{stage} of \"{}\" failed: {source}", file.display())]
pub struct ItemError {
    pub file: PathBuf,
    pub stage: Stage,
    #[source]
    pub source: StageError
}

#[derive(thiserror::Error, Debug)]
pub enum DigestError {
    #[error("no images to process")]
    EmptyBatch,

    #[error("invalid radius override: {0}")]
    InvalidRadius(#[source] SpeckleError),

    /// The reference image could not provide the batch-wide radius.
    #[error("cannot establish radius: {0}")]
    RadiusDerivation(#[source] ItemError),

    #[error(transparent)]
    Log(#[from] LogError)
}

/// What to do after an image fails.
#[derive(Copy, Clone, Debug, strum_macros::EnumIter, PartialEq)]
pub enum FailurePolicy {
    /// Report the failure and process remaining images.
    Continue,
    /// Report the failure and stop.
    Abort
}

impl Default for FailurePolicy {
    fn default() -> FailurePolicy { FailurePolicy::Continue }
}

/// Counts of images logged and failed.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Summary {
    pub processed: usize,
    pub failed: usize
}

fn file_name(path: &Path) -> String {
    match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => path.display().to_string()
    }
}

/// Decodes `path` and calculates its speckle contrast using `radius` around the image's own centroid.
fn process_file<S: ImageSource + ?Sized>(source: &S, radius: f64, path: &Path) -> Result<ContrastResult, ItemError> {
    let image = source.load(path).map_err(|e| ItemError{
        file: path.to_path_buf(), stage: Stage::Decoding, source: e.into()
    })?;

    let contrast = speckle::speckle_contrast(&image, radius).map_err(|e| ItemError{
        file: path.to_path_buf(), stage: Stage::ContrastComputation, source: e.into()
    })?;

    Ok(ContrastResult{ file_name: file_name(path), contrast, timestamp: Local::now() })
}

/// Decodes the reference image and determines the batch-wide radius from it.
fn derive_radius<S, R>(source: &S, solver: &R, path: &Path) -> Result<f64, DigestError>
where S: ImageSource + ?Sized,
      R: RadiusSolver + ?Sized
{
    log::info!("Determining region of interest radius from \"{}\"...", file_name(path));

    let image = source.load(path).map_err(|e| DigestError::RadiusDerivation(ItemError{
        file: path.to_path_buf(), stage: Stage::Decoding, source: e.into()
    }))?;

    let radius = solver.solve_radius(&image).map_err(|e| DigestError::RadiusDerivation(ItemError{
        file: path.to_path_buf(), stage: Stage::RadiusDerivation, source: e.into()
    }))?;

    Ok(radius)
}

/// Lazily computes speckle contrast of consecutive images.
///
/// The region of interest radius is established once, when the digest is created, and used for all images.
/// Each image's own centroid is the center of its region of interest.
///
pub struct Digest<'a, S: ImageSource + ?Sized> {
    files: std::vec::IntoIter<PathBuf>,
    num_files: usize,
    num_started: usize,
    source: &'a S,
    radius: f64,
    policy: FailurePolicy,
    stopped: bool
}

impl<'a, S: ImageSource + ?Sized> Digest<'a, S> {
    /// Creates a digest of `files` (in processing order).
    ///
    /// # Parameters
    ///
    /// * `radius_override` - If given, used for all images; `solver` is then not invoked.
    /// * `solver` - Determines the radius from the first image if there is no override.
    ///
    pub fn new<R: RadiusSolver + ?Sized>(
        files: Vec<PathBuf>,
        source: &'a S,
        radius_override: Option<f64>,
        solver: &R,
        policy: FailurePolicy
    ) -> Result<Digest<'a, S>, DigestError> {
        if files.is_empty() {
            return Err(DigestError::EmptyBatch);
        }

        let radius = match radius_override {
            Some(radius) => {
                if !(radius.is_finite() && radius > 0.0) {
                    return Err(DigestError::InvalidRadius(SpeckleError::InvalidGeometry(
                        format!("radius must be positive and finite, got {}", radius)
                    )));
                }
                radius
            },

            None => derive_radius(source, solver, &files[0])?
        };

        Ok(Digest{
            num_files: files.len(),
            files: files.into_iter(),
            num_started: 0,
            source,
            radius,
            policy,
            stopped: false
        })
    }

    pub fn radius(&self) -> f64 { self.radius }

    pub fn num_files(&self) -> usize { self.num_files }

    /// Processes all remaining images in parallel; results are in processing order.
    ///
    /// With `FailurePolicy::Abort` results after the first failure are discarded.
    ///
    pub fn collect_parallel(self) -> Vec<Result<ContrastResult, ItemError>>
    where S: Sync
    {
        if self.stopped {
            return vec![];
        }

        let files: Vec<PathBuf> = self.files.collect();
        let source = self.source;
        let radius = self.radius;
        let num_files = self.num_files;
        let first_idx = self.num_started;

        let mut results: Vec<_> = files.par_iter().enumerate().map(|(i, file)| {
            log::info!("Processing file \"{}\"... ({} of {})", file_name(file), first_idx + i + 1, num_files);
            process_file(source, radius, file)
        }).collect();

        if self.policy == FailurePolicy::Abort {
            if let Some(first_failure) = results.iter().position(|r| r.is_err()) {
                results.truncate(first_failure + 1);
            }
        }

        results
    }
}

impl<'a, S: ImageSource + ?Sized> Iterator for Digest<'a, S> {
    type Item = Result<ContrastResult, ItemError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stopped {
            return None;
        }

        let file = self.files.next()?;
        self.num_started += 1;
        log::info!("Processing file \"{}\"... ({} of {})", file_name(&file), self.num_started, self.num_files);

        let result = process_file(self.source, self.radius, &file);
        if result.is_err() && self.policy == FailurePolicy::Abort {
            self.stopped = true;
        }

        Some(result)
    }
}

/// Appends successful results to `sink`; failures are reported as warnings.
///
/// The sink is written only after a successful contrast computation, so a failed image leaves no trace in it.
///
pub fn run<I, L>(results: I, sink: &mut L) -> Result<Summary, DigestError>
where I: IntoIterator<Item = Result<ContrastResult, ItemError>>,
      L: LogSink + ?Sized
{
    let mut summary = Summary::default();

    for result in results {
        match result {
            Ok(result) => {
                sink.append(&result)?;
                log::debug!("{}: speckle contrast = {}", result.file_name, result.contrast);
                summary.processed += 1;
            },

            Err(err) => {
                log::warn!("Skipping image: {}", err);
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}
