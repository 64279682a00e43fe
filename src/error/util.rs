//! Utility functions for error handling
//!
//! File helpers that attach the path and purpose to IO failures.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{EveError, Result};

/// UTF-8 byte-order mark
pub const UTF8_BOM: &str = "\u{feff}";

/// Safely open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.is_file() {
        return Err(EveError::from(io::Error::new(
            io::ErrorKind::NotFound,
            format!("File not found, needed for: {purpose}"),
        ))
        .with_path(path));
    }

    fs::File::open(path).map_err(|e| {
        let message = match e.kind() {
            io::ErrorKind::PermissionDenied => {
                "Permission denied - check file permissions".to_string()
            }
            _ => format!("Failed to open file for: {purpose}"),
        };
        EveError::from(io::Error::new(e.kind(), message)).with_path(path)
    })
}

/// Safely read a file to string, stripping a leading byte-order mark
pub fn safe_read_to_string(path: &Path, purpose: &str) -> Result<String> {
    let mut file = safe_open_file(path, purpose)?;

    let mut content = String::new();
    match io::Read::read_to_string(&mut file, &mut content) {
        Ok(_) => Ok(strip_bom(&content).to_string()),
        Err(e) => {
            let message = match e.kind() {
                io::ErrorKind::InvalidData => {
                    "File contains invalid UTF-8 data - cannot read as text".to_string()
                }
                _ => format!("Failed to read file content for: {purpose}"),
            };
            Err(EveError::from(io::Error::new(e.kind(), message)).with_path(path))
        }
    }
}

/// Make sure a directory exists, creating it when missing
pub fn ensure_directory(path: &Path, purpose: &str) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    if path.exists() {
        return Err(EveError::from(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Path is not a directory, expected one for: {purpose}"),
        ))
        .with_path(path));
    }
    fs::create_dir_all(path).map_err(|e| EveError::from(e).with_path(path))
}

/// Strip a leading UTF-8 byte-order mark, if any
#[must_use]
pub fn strip_bom(content: &str) -> &str {
    content.strip_prefix(UTF8_BOM).unwrap_or(content)
}
