//
// speckletool - Speckle contrast measurement for laser speckle images
// Copyright (c) 2020 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Utilities: input file discovery and list files.
//!

use std::io::BufRead;
use std::path::{Path, PathBuf};

/// Returns all non-empty lines of the specified file (surrounding whitespace removed).
pub fn parse_list_file(file_name: &Path) -> std::io::Result<Vec<PathBuf>> {
    let list_file = std::fs::OpenOptions::new().read(true).write(false).open(file_name)?;
    parse_list_file_priv(std::io::BufReader::new(list_file).lines())
}

/// Implements `parse_list_file`.
fn parse_list_file_priv<B: BufRead>(lines: std::io::Lines<B>) -> std::io::Result<Vec<PathBuf>> {
    let mut files = vec![];
    for line in lines {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            files.push(PathBuf::from(trimmed));
        }
    }

    Ok(files)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    match path.extension() {
        Some(ext) => ext.to_string_lossy().eq_ignore_ascii_case(extension),
        None => false
    }
}

/// Recursively finds files with the specified extension (case-insensitive, without the leading dot).
///
/// Entries of each directory are visited in file name order; files of a directory precede
/// the contents of its subdirectories.
///
pub fn discover_images(root: &Path, extension: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut found = vec![];
    discover_images_into(root, extension.trim_start_matches('.'), &mut found)?;

    Ok(found)
}

fn discover_images_into(dir: &Path, extension: &str, found: &mut Vec<PathBuf>) -> std::io::Result<()> {
    let mut entries = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<PathBuf>>>()?;
    entries.sort();

    let mut subdirs = vec![];
    for path in entries {
        if path.is_dir() {
            subdirs.push(path);
        } else if has_extension(&path, extension) {
            found.push(path);
        }
    }

    for subdir in subdirs {
        discover_images_into(&subdir, extension, found)?;
    }

    Ok(())
}
