//! Finding input files in the working directory.

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use glob::{MatchOptions, Pattern, glob_with};
use std::path::{Path, PathBuf};

const OPTIONS: MatchOptions =
    MatchOptions { case_sensitive: false, require_literal_separator: true, require_literal_leading_dot: true };

/// Files in `dir` with the extension `ext`, in alphabetical order. Entries
/// that can't be read are ignored.
fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let dir_str = dir.to_str().ok_or_raise(|| ErrorKind::Discovery(dir.to_path_buf()))?;
    let pattern = format!("{}/*.{ext}", Pattern::escape(dir_str));
    let paths = glob_with(&pattern, OPTIONS).or_raise(|| ErrorKind::Discovery(dir.to_path_buf()))?;
    let mut files: Vec<PathBuf> = paths.filter_map(|path| path.ok()).filter(|path| path.is_file()).collect();
    files.sort();
    Ok(files)
}

/// The first `*.epub` in `dir`, skipping backups left by earlier runs (file
/// names starting with `backup_prefix`).
pub fn find_source(dir: &Path, backup_prefix: &str) -> Result<Option<PathBuf>> {
    let source = files_with_extension(dir, "epub")?.into_iter().find(|path| {
        backup_prefix.is_empty()
            || !path.file_name().and_then(|name| name.to_str()).is_some_and(|name| name.starts_with(backup_prefix))
    });
    Ok(source)
}

/// The first `*.csv` in `dir`.
pub fn find_metadata(dir: &Path) -> Result<Option<PathBuf>> {
    Ok(files_with_extension(dir, "csv")?.into_iter().next())
}
