use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const NOTEBOOK_EXTENSION: &str = "ipynb";

/// Check that `path` names a readable `.ipynb` file and return its absolute
/// form.
pub fn validate_notebook_path(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(Error::Validation("path cannot be empty".to_string()));
    }

    let has_extension = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(NOTEBOOK_EXTENSION));
    if !has_extension {
        return Err(Error::Validation(format!(
            "{} is not an .{NOTEBOOK_EXTENSION} file",
            path.display()
        )));
    }

    let metadata = path
        .metadata()
        .map_err(|e| Error::Validation(format!("{}: {e}", path.display())))?;
    if !metadata.is_file() {
        return Err(Error::Validation(format!(
            "{} is not a file",
            path.display()
        )));
    }

    File::open(path).map_err(|e| Error::Validation(format!("{}: {e}", path.display())))?;

    std::path::absolute(path).map_err(|e| Error::Validation(format!("{}: {e}", path.display())))
}

/// Turn a checkpoint name into a file name stem that stays inside the target
/// directory.
pub(crate) fn file_stem_for(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();

    match stem.trim() {
        "" | "." | ".." => "checkpoint".to_string(),
        _ => stem,
    }
}
