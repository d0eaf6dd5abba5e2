//! Directory loading of template documents
//!
//! Walks a directory recursively and collects every file with the template
//! extension (`.prompty` by default), in a stable sorted order.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::DocumentError;
use crate::template::model::Category;

/// Extension used when none is configured
pub const DEFAULT_EXTENSION: &str = "prompty";

/// Recursively find every document with the given extension under `dir`
///
/// # Errors
///
/// Returns `DocumentError::Io` if a directory cannot be read.
pub fn find_documents(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, DocumentError> {
    let extension = extension.trim_start_matches('.');
    let mut found = Vec::new();
    find_recursive(dir, extension, &mut found)?;
    found.sort();
    Ok(found)
}

fn find_recursive(current: &Path, extension: &str, found: &mut Vec<PathBuf>) -> Result<(), DocumentError> {
    let io_error = |source| DocumentError::Io {
        path: current.to_path_buf(),
        source,
    };
    for entry in std::fs::read_dir(current).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_dir() {
            find_recursive(&path, extension, found)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            found.push(path);
        }
    }
    Ok(())
}

/// Category named by a document's parent directory, e.g. `professional/`
///
/// Directories that do not name a known category give `None`.
pub fn directory_category(path: &Path) -> Option<Category> {
    let name = path.parent()?.file_name()?.to_str()?;
    let category = Category::from(name.to_string());
    (category != Category::Custom).then_some(category)
}

/// Outcome of loading a directory into a registry
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    /// Ids of templates that were registered, in load order
    pub registered: Vec<String>,
    pub failures: Vec<LoadFailure>,
}

/// A document that could not be parsed or registered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub reason: String,
}
