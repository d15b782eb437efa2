//! Local file validation: existence, size, markers, directory coverage.
//!
//! Callers gate content checks on [`file_exists`]; the functions here return
//! an error rather than a verdict when asked to read a missing file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::Marker;
use crate::domain::Result;

/// Whether `path` exists and is a regular file.
pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}

/// Whether the file is strictly larger than `threshold_bytes`.
pub fn file_size_above(path: &Path, threshold_bytes: u64) -> Result<bool> {
    Ok(file_size(path)? > threshold_bytes)
}

pub fn file_size(path: &Path) -> Result<u64> {
    Ok(std::fs::metadata(path)?.len())
}

/// Whether the file contains the marker. Invalid UTF-8 is read lossily.
pub fn contains_marker(path: &Path, marker: &Marker) -> Result<bool> {
    let bytes = std::fs::read(path)?;
    marker.matches(&String::from_utf8_lossy(&bytes))
}

/// File contents with surrounding whitespace removed.
pub fn read_trimmed(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path)?.trim().to_string())
}

/// How many immediate subdirectories contain a required entry file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryCoverage {
    pub valid: usize,
    pub total: usize,
    /// Names of subdirectories lacking the entry file, sorted.
    pub missing: Vec<String>,
}

impl DirectoryCoverage {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// "valid/total", e.g. "8/10".
    pub fn ratio(&self) -> String {
        format!("{}/{}", self.valid, self.total)
    }
}

/// Enumerate the immediate subdirectories of `parent` and check each for
/// `required`. Files directly under `parent` are ignored, as are hidden
/// directories.
pub fn all_subdirectories_have_file(parent: &Path, required: &str) -> Result<DirectoryCoverage> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(parent)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    names.sort();

    let mut coverage = DirectoryCoverage {
        total: names.len(),
        ..Default::default()
    };
    for name in names {
        if parent.join(&name).join(required).is_file() {
            coverage.valid += 1;
        } else {
            coverage.missing.push(name);
        }
    }
    Ok(coverage)
}
