use std::ffi::OsString;
use std::io::Result as IoResult;
use std::path::{Path, PathBuf};
use tokio::fs;

/// The file name of backup candidate number `attempt` (starting at 1):
/// `old-book.epub`, then `old-2-book.epub`, `old-3-book.epub` and so on.
fn candidate(prefix: &str, file_name: &OsString, attempt: u32) -> OsString {
    let mut name = match attempt {
        0 | 1 => OsString::from(prefix),
        n => OsString::from(format!("{prefix}{n}-")),
    };
    name.push(file_name);
    name
}

/// The first backup name for `source` that doesn't exist yet, next to
/// `source`. An existing backup is never overwritten.
pub async fn backup_path(source: &Path, prefix: &str) -> IoResult<PathBuf> {
    let file_name = source.file_name().map(OsString::from).unwrap_or_default();
    let dir = source.parent().unwrap_or(Path::new(""));
    let mut attempt = 1;
    loop {
        let path = dir.join(candidate(prefix, &file_name, attempt));
        if !fs::try_exists(&path).await? {
            return Ok(path);
        }
        attempt += 1;
    }
}
