//
// speckletool - Speckle contrast measurement for laser speckle images
// Copyright (c) 2020 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Command-line options definitions and parsing.
//!

use crate::digest::FailurePolicy;
use crate::logging;
use crate::speckle::SolverParams;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;

pub mod cmdline {
    pub const HELP:           &str = "help";
    pub const INPUT_DIRECTORY: &str = "input_dir";
    pub const INPUT_FILES:    &str = "input_files";
    pub const INPUT_LIST:     &str = "input_list";
    pub const EXTENSION:      &str = "extension";
    pub const OUTPUT_FILE:    &str = "output";
    pub const RADIUS:         &str = "radius";
    pub const CUTOFF:         &str = "cutoff";
    pub const TOLERANCE:      &str = "tolerance";
    pub const MAX_ITERATIONS: &str = "max_iterations";
    pub const ON_ERROR:       &str = "on_error";
    pub const PARALLEL:       &str = "parallel";
    pub const LOG_LEVEL:      &str = "log_level";
}

pub const DEFAULT_EXTENSION: &str = "TIF";
pub const DEFAULT_OUTPUT_FILE: &str = "digest.csv";

#[derive(Debug, PartialEq)]
pub enum InputFiles {
    /// Root of recursive search.
    Directory(PathBuf),
    CommandLineList(Vec<PathBuf>),
    ListFile(PathBuf)
}

#[derive(Debug)]
pub struct Configuration {
    input_files: InputFiles,
    extension: String,
    output_file: Option<PathBuf>,
    radius: Option<f64>,
    solver_params: SolverParams,
    on_error: FailurePolicy,
    parallel: bool,
    log_level: logging::Level
}

impl Configuration {
    pub fn input_files(&self) -> &InputFiles { &self.input_files }
    pub fn extension(&self) -> &str { &self.extension }
    pub fn radius(&self) -> Option<f64> { self.radius }
    pub fn solver_params(&self) -> &SolverParams { &self.solver_params }
    pub fn on_error(&self) -> FailurePolicy { self.on_error }
    pub fn parallel(&self) -> bool { self.parallel }
    pub fn log_level(&self) -> logging::Level { self.log_level }

    /// Returns the explicitly given log file, or "digest.csv" in the input directory (if any).
    pub fn output_file(&self) -> PathBuf {
        match (&self.output_file, &self.input_files) {
            (Some(output_file), _) => output_file.clone(),
            (None, InputFiles::Directory(root)) => root.join(DEFAULT_OUTPUT_FILE),
            (None, _) => Path::new(DEFAULT_OUTPUT_FILE).to_path_buf()
        }
    }
}

impl From<logging::Level> for &str {
    fn from(level: logging::Level) -> &'static str {
        match level {
            logging::Level::Quiet   => "quiet",
            logging::Level::Info    => "info",
            logging::Level::Verbose => "verbose"
        }
    }
}

impl std::str::FromStr for logging::Level {
    type Err = ();
    fn from_str(s: &str) -> Result<logging::Level, ()> {

        for level in logging::Level::iter() {
            if s == Into::<&str>::into(level) {
                return Ok(level);
            }
        }

        Err(())
    }
}

impl From<FailurePolicy> for &str {
    fn from(policy: FailurePolicy) -> &'static str {
        match policy {
            FailurePolicy::Continue => "continue",
            FailurePolicy::Abort    => "abort"
        }
    }
}

impl std::str::FromStr for FailurePolicy {
    type Err = ();
    fn from_str(s: &str) -> Result<FailurePolicy, ()> {
        FailurePolicy::iter().find(|policy| s == Into::<&str>::into(*policy)).ok_or(())
    }
}

pub fn print_help() {
    let defaults = SolverParams::default();

    println!(
r#"Command-line options:

  Input (exactly one is required):

    --{} <directory>

      Directory to search (recursively) for images with the extension given by --{}.


    --{} <file1 file2 ...>

      Input files in processing order. The first one is the reference image for --{}.


    --{} <file>

      File containing the list of input files in processing order (one file per line).


  Other options:

    --{} <extension>

      Extension of images to search for (case-insensitive). Default: {}.


    --{} <file>

      CSV file to which results are appended. Default: "{}" in the input directory, or in the current
      directory if --{} is not used.


    --{} <pixels>

      Radius of the region of interest used for all images. If not specified, it is determined from the first
      image as the radius enclosing the --{} fraction of total intensity.


    --{} <value>

      Fraction of total intensity enclosed by the region of interest; (0, 1]. Default: {}.


    --{} <pixels>

      Tolerance of the region of interest radius. Default: {}.


    --{} <count>

      Max. number of iterations of the radius search. Default: {}.


    --{} <{}|{}>

      Whether to continue with remaining images after an image fails. Default: {}.


    --{} <yes|no>

      Process images in parallel. Default: no.


    --{} <{}|{}|{}>

      Chooses the amount of messages to print during processing.

"#,
        cmdline::INPUT_DIRECTORY, cmdline::EXTENSION,

        cmdline::INPUT_FILES, cmdline::RADIUS,

        cmdline::INPUT_LIST,

        cmdline::EXTENSION, DEFAULT_EXTENSION,

        cmdline::OUTPUT_FILE, DEFAULT_OUTPUT_FILE, cmdline::INPUT_DIRECTORY,

        cmdline::RADIUS, cmdline::CUTOFF,

        cmdline::CUTOFF, defaults.cutoff,

        cmdline::TOLERANCE, defaults.tolerance,

        cmdline::MAX_ITERATIONS, defaults.max_iterations,

        cmdline::ON_ERROR,
        Into::<&str>::into(FailurePolicy::Continue),
        Into::<&str>::into(FailurePolicy::Abort),
        Into::<&str>::into(FailurePolicy::Continue),

        cmdline::PARALLEL,

        cmdline::LOG_LEVEL,
        Into::<&str>::into(logging::Level::Quiet),
        Into::<&str>::into(logging::Level::Info),
        Into::<&str>::into(logging::Level::Verbose),
    );
}

/// Returns the value of a single-valued option of type `T`.
fn get_option_value<T: std::str::FromStr>(
    option: &str,
    option_values: &std::collections::HashMap::<String, Vec<String>>
) -> Result<Option<T>, ()> {
    match option_values.get(option) {
        None => Ok(None),
        Some(vals) => if vals.is_empty() {
            eprintln!("Value missing for option {}.", option);
            Err(())
        } else if vals.len() > 1 {
            eprintln!("Too many values for option {}.", option);
            Err(())
        } else {
            match vals[0].parse::<T>() {
                Ok(value) => Ok(Some(value)),
                Err(_) => {
                    eprintln!("Invalid value for option {}: {}.", option, vals[0]);
                    Err(())
                }
            }
        }
    }
}

/// Parses "yes" or "no".
fn get_yes_no_value(
    option: &str,
    option_values: &std::collections::HashMap::<String, Vec<String>>
) -> Result<Option<bool>, ()> {
    match get_option_value::<String>(option, option_values)? {
        None => Ok(None),
        Some(val) => match val.as_str() {
            "yes" => Ok(Some(true)),
            "no" => Ok(Some(false)),
            _ => {
                eprintln!("Invalid value for option {}: {}.", option, val);
                Err(())
            }
        }
    }
}

/// Returns Ok(None) if help was requested.
pub fn parse_command_line<I: Iterator<Item=String>>(stream: I) -> Result<Option<Configuration>, ()> {
    let allowed_options = vec![
     cmdline::HELP,
     cmdline::INPUT_DIRECTORY,
     cmdline::INPUT_FILES,
     cmdline::INPUT_LIST,
     cmdline::EXTENSION,
     cmdline::OUTPUT_FILE,
     cmdline::RADIUS,
     cmdline::CUTOFF,
     cmdline::TOLERANCE,
     cmdline::MAX_ITERATIONS,
     cmdline::ON_ERROR,
     cmdline::PARALLEL,
     cmdline::LOG_LEVEL
    ];

    // key: option name
    let mut option_values = std::collections::HashMap::<String, Vec<String>>::new();

    let mut current: Option<&mut Vec<String>> = None;

    for arg in stream.skip(1) /*skip the binary name*/ {
        if arg.starts_with("--") {
            match &arg[2..] {
                cmdline::HELP => { print_help(); return Ok(None); },
                x if !allowed_options.contains(&x) => {
                    eprintln!("Unknown command-line option: {}.", x); return Err(());
                },
                opt => current = Some(option_values.entry(opt.to_string()).or_insert(vec![])),
            }
        } else {
            match current.as_mut() {
                None => {
                    eprintln!("Unexpected value: {}.", arg);
                    return Err(());
                },
                Some(values) => values.push(arg)
            }
        }
    }

    let num_inputs = [cmdline::INPUT_DIRECTORY, cmdline::INPUT_FILES, cmdline::INPUT_LIST].iter()
        .filter(|opt| option_values.contains_key(**opt))
        .count();
    if num_inputs > 1 {
        eprintln!("Only one of --{}, --{}, --{} can be used.",
            cmdline::INPUT_DIRECTORY, cmdline::INPUT_FILES, cmdline::INPUT_LIST
        );
        return Err(());
    }

    let input_files = if let Some(dir) = get_option_value::<PathBuf>(cmdline::INPUT_DIRECTORY, &option_values)? {
        InputFiles::Directory(dir)
    } else if let Some(list) = get_option_value::<PathBuf>(cmdline::INPUT_LIST, &option_values)? {
        InputFiles::ListFile(list)
    } else {
        match option_values.get(cmdline::INPUT_FILES) {
            Some(vals) if !vals.is_empty() => InputFiles::CommandLineList(vals.iter().map(PathBuf::from).collect()),
            _ => {
                eprintln!("Input files not specified.");
                return Err(());
            }
        }
    };

    let extension = get_option_value::<String>(cmdline::EXTENSION, &option_values)?;
    if extension.is_some() && !matches!(input_files, InputFiles::Directory(_)) {
        eprintln!("Unexpected option {} (--{} was not specified).", cmdline::EXTENSION, cmdline::INPUT_DIRECTORY);
        return Err(());
    }
    let extension = extension.unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    let output_file = get_option_value::<PathBuf>(cmdline::OUTPUT_FILE, &option_values)?;

    let radius = get_option_value::<f64>(cmdline::RADIUS, &option_values)?;
    if let Some(radius) = radius {
        if !(radius.is_finite() && radius > 0.0) {
            eprintln!("Radius must be positive, got {}.", radius);
            return Err(());
        }
        for opt in &[cmdline::CUTOFF, cmdline::TOLERANCE, cmdline::MAX_ITERATIONS] {
            if option_values.contains_key(*opt) {
                eprintln!("Unexpected option {} (radius is given by --{}).", opt, cmdline::RADIUS);
                return Err(());
            }
        }
    }

    let defaults = SolverParams::default();
    let solver_params = SolverParams{
        cutoff: get_option_value::<f64>(cmdline::CUTOFF, &option_values)?.unwrap_or(defaults.cutoff),
        tolerance: get_option_value::<f64>(cmdline::TOLERANCE, &option_values)?.unwrap_or(defaults.tolerance),
        max_iterations: get_option_value::<usize>(cmdline::MAX_ITERATIONS, &option_values)?
            .unwrap_or(defaults.max_iterations)
    };
    if let Err(err) = solver_params.validate() {
        eprintln!("Invalid radius search settings: {}.", err);
        return Err(());
    }

    let on_error = get_option_value::<FailurePolicy>(cmdline::ON_ERROR, &option_values)?
        .unwrap_or_default();

    let parallel = get_yes_no_value(cmdline::PARALLEL, &option_values)?.unwrap_or(false);

    let log_level = get_option_value::<logging::Level>(cmdline::LOG_LEVEL, &option_values)?
        .unwrap_or(logging::Level::Info);

    Ok(Some(Configuration{
        input_files,
        extension,
        output_file,
        radius,
        solver_params,
        on_error,
        parallel,
        log_level
    }))
}
