//
// speckletool - Speckle contrast measurement for laser speckle images
// Copyright (c) 2020 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Entry point and main functions of the `speckletool` executable.
//!

mod args;
mod digest;
mod image;
mod logging;
mod speckle;
mod utils;

use args::InputFiles;
use digest::{Digest, FailurePolicy, FileImageSource, sink::CsvLog};
use std::path::PathBuf;

const VERSION_STRING: &'static str = include_str!(concat!(env!("OUT_DIR"), "/version"));

fn print_header() {
    println!(r#"
_________________

   {}
   Speckle contrast measurement for laser speckle images

   Copyright © 2020 Filip Szczerek <ga.software@yahoo.com>

   This program is licensed under MIT license (see LICENSE.txt for details).

_________________
"#,
        VERSION_STRING
    );
}

fn input_file_list(config: &args::Configuration) -> std::io::Result<Vec<PathBuf>> {
    match config.input_files() {
        InputFiles::Directory(root) => {
            log::info!("Searching for *.{} files in \"{}\"...", config.extension(), root.display());
            utils::discover_images(root, config.extension())
        },
        InputFiles::CommandLineList(list) => Ok(list.clone()),
        InputFiles::ListFile(list_file) => utils::parse_list_file(list_file)
    }
}

/// Processes all input images; returns false on a fatal error or (with the abort policy) on any failure.
fn create_digest(config: &args::Configuration) -> bool {
    let input_files = match input_file_list(config) {
        Ok(files) => files,
        Err(err) => { log::error!("cannot read input file list: {}", err); return false; }
    };

    let source = FileImageSource;
    let batch = match Digest::new(
        input_files,
        &source,
        config.radius(),
        config.solver_params(),
        config.on_error()
    ) {
        Ok(batch) => batch,
        Err(err) => { log::error!("{}", err); return false; }
    };
    log::info!("Processing {} image(s) with region of interest radius {:.3} px.", batch.num_files(), batch.radius());

    let output_file = config.output_file();
    let mut csv_log = match CsvLog::open(&output_file) {
        Ok(csv_log) => csv_log,
        Err(err) => { log::error!("{}", err); return false; }
    };

    let summary = if config.parallel() {
        digest::run(batch.collect_parallel(), &mut csv_log)
    } else {
        digest::run(batch, &mut csv_log)
    };

    match summary {
        Ok(summary) => {
            log::info!(
                "\nLogged {} result(s) to \"{}\", {} image(s) failed.",
                summary.processed, csv_log.path().display(), summary.failed
            );
            !(summary.failed > 0 && config.on_error() == FailurePolicy::Abort)
        },

        Err(err) => { log::error!("{}", err); false }
    }
}

fn run_program() -> bool {
    print_header();
    println!();

    let config = match args::parse_command_line(std::env::args()) {
        Ok(config) => match config {
            None => return true, // help was requested
            Some(config) => config
        },
        Err(_) => { println!("\nUse --{} for more information.\n", args::cmdline::HELP); return false; }
    };

    let _logger = match logging::setup_logging(config.log_level()) {
        Ok(logger) => logger,
        Err(err) => { eprintln!("Cannot initialize logging: {}", err); return false; }
    };

    let tstart = std::time::Instant::now();

    let success = create_digest(&config);

    let elapsed = tstart.elapsed();
    let mins = elapsed.as_secs() / 60;
    let secs = elapsed.as_secs() % 60;
    let frac_secs = elapsed.as_secs_f32() - (mins * 60) as f32 - secs as f32;
    log::info!("Completed in {} min {:02}.{:0.0} s.", mins, secs, frac_secs * 10.0);

    success
}

fn main() {
    std::process::exit(if run_program() { 0 } else { 1 });
}
