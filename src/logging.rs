//
// speckletool - Speckle contrast measurement for laser speckle images
// Copyright (c) 2020 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Logging setup.
//!

use flexi_logger::{DeferredNow, FlexiLoggerError, Logger, LoggerHandle};
use log::Record;

#[derive(Copy, Clone, Debug, strum_macros::EnumIter, PartialEq)]
pub enum Level {
    /// Warnings and errors only.
    Quiet,
    Info,
    /// Also per-image details and solver diagnostics.
    Verbose
}

impl Level {
    fn filter_spec(&self) -> &'static str {
        match self {
            Level::Quiet   => "warn",
            Level::Info    => "info",
            Level::Verbose => "debug"
        }
    }
}

/// Prints the message alone; warnings and errors are prefixed with their level.
fn message_format(w: &mut dyn std::io::Write, _now: &mut DeferredNow, record: &Record) -> std::io::Result<()> {
    match record.level() {
        log::Level::Error => write!(w, "Error: {}", record.args()),
        log::Level::Warn => write!(w, "Warning: {}", record.args()),
        _ => write!(w, "{}", record.args())
    }
}

/// Starts logging to stdout. The returned handle must be kept alive for the duration of the program.
pub fn setup_logging(level: Level) -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_str(level.filter_spec())?
        .log_to_stdout()
        .format(message_format)
        .start()
}
