//
// speckletool - Speckle contrast measurement for laser speckle images
// Copyright (c) 2020 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Append-only result log.
//!

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use super::ContrastResult;

pub const HEADER: [&str; 3] = ["Filename", "Speckle Contrast", "Timestamp"];

/// Timestamp format of log records, e.g. "17 Oct 2026 14:05".
pub const TIMESTAMP_FORMAT: &str = "%d %b %Y %H:%M";

#[derive(thiserror::Error, Debug)]
pub enum LogError {
    #[error("cannot open log file {}: {source}", path.display())]
    Open { path: PathBuf, source: std::io::Error },

    #[error("cannot write log record: {0}")]
    Csv(#[from] csv::Error),

    #[error("cannot write log record: {0}")]
    Io(#[from] std::io::Error)
}

/// Receives results one at a time.
pub trait LogSink {
    fn append(&mut self, result: &ContrastResult) -> Result<(), LogError>;
}

impl LogSink for Vec<ContrastResult> {
    fn append(&mut self, result: &ContrastResult) -> Result<(), LogError> {
        self.push(result.clone());
        Ok(())
    }
}

/// CSV file opened for appending; the header row precedes the first record written to an empty file.
pub struct CsvLog {
    path: PathBuf,
    writer: csv::Writer<File>,
    needs_header: bool
}

impl CsvLog {
    pub fn open(path: &Path) -> Result<CsvLog, LogError> {
        let file = OpenOptions::new().create(true).append(true).open(path)
            .map_err(|source| LogError::Open{ path: path.to_path_buf(), source })?;

        let needs_header = file.metadata()?.len() == 0;
        let writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        Ok(CsvLog{ path: path.to_path_buf(), writer, needs_header })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for CsvLog {
    /// Writes and flushes a single record.
    fn append(&mut self, result: &ContrastResult) -> Result<(), LogError> {
        if self.needs_header {
            self.writer.write_record(&HEADER)?;
            self.needs_header = false;
        }
        self.writer.write_record(&[
            result.file_name.clone(),
            result.contrast.to_string(),
            result.timestamp.format(TIMESTAMP_FORMAT).to_string()
        ])?;
        self.writer.flush()?;

        Ok(())
    }
}
