//! Work item sources: JSON row files and payload directories.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::CliError;

/// One row to post: column name to value.
pub type Row = Map<String, Value>;

/// Load a JSON array of objects.
pub fn load_rows(path: &Path) -> Result<Vec<Row>, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Source {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| CliError::Rows {
        path: path.display().to_string(),
        source,
    })
}

/// List every entry of a directory, sorted by name.
///
/// Entries are not filtered: one that cannot be read as a file fails on its
/// own when its item runs.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>, CliError> {
    let source_err = |source| CliError::Source {
        path: dir.display().to_string(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(source_err)? {
        files.push(entry.map_err(source_err)?.path());
    }
    files.sort();
    Ok(files)
}
