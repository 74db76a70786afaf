//! Candidate file discovery
//!
//! Only files bearing the configured extension are offered for encryption,
//! decryption, or display. The directory walk sits behind a trait so the
//! filtering logic can be tested without touching the filesystem.

use crate::error::{ErrorCategory, ErrorKind, Result, TextcryptError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Source of directory entries.
pub trait DirectoryLister {
    /// All entries of `dir` that are plain files.
    fn entries(&self, dir: &Path) -> Result<Vec<PathBuf>>;
}

/// Lists a real directory on disk.
pub struct FsDirectoryLister;

impl DirectoryLister for FsDirectoryLister {
    fn entries(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let read_dir = fs::read_dir(dir).map_err(|e| list_error(dir, e))?;
        let mut paths = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| list_error(dir, e))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if is_file {
                paths.push(entry.path());
            }
        }
        Ok(paths)
    }
}

/// The filenames in `dir` bearing `extension`, sorted by name.
///
/// `extension` is given without the leading dot. Entries whose names are not
/// valid UTF-8 are skipped; they could not be presented or typed back in
/// anyway.
pub fn list_candidates(
    lister: &dyn DirectoryLister,
    dir: &Path,
    extension: &str,
) -> Result<Vec<String>> {
    let mut names: Vec<String> = lister
        .entries(dir)?
        .into_iter()
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(extension))
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
        .collect();
    names.sort();
    Ok(names)
}

fn list_error(dir: &Path, err: io::Error) -> TextcryptError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    TextcryptError::with_kind_and_source(
        category,
        ErrorKind::Read,
        format!("failed to list directory {}", dir.display()),
        err,
    )
}
