//! Path validation for staged files.
//!
//! Archive member names are untrusted: a crafted archive can name a member
//! `../../.bashrc`. Every path is resolved here before it is joined onto the
//! staging root.

use crate::error::{ErrorKind, Result};
use exn::OptionExt;
use std::path::{Path, PathBuf};

/// Resolve an archive member name to a relative path under the staging root.
///
/// Names are split on `/` and on `\`, which archives written on Windows use.
/// Empty and `.` segments are dropped and `..` climbs one level. A name is
/// rejected if it climbs above the root, starts with a drive (`C:`), contains
/// a NUL byte or resolves to nothing.
///
/// ```
/// use std::path::Path;
/// use epubfix_storage::entry_path;
/// assert_eq!(entry_path("OEBPS\\Text\\ch1.xhtml").unwrap(), Path::new("OEBPS/Text/ch1.xhtml"));
/// assert_eq!(entry_path("/OEBPS//./Images/cover.jpg").unwrap(), Path::new("OEBPS/Images/cover.jpg"));
/// assert!(entry_path("OEBPS/../mimetype").is_ok());
/// assert!(entry_path("OEBPS/../../b").is_err());
/// assert!(entry_path("..\\..\\evil").is_err());
/// ```
pub fn entry_path(name: &str) -> Result<PathBuf> {
    let invalid = || ErrorKind::InvalidPath(PathBuf::from(name));
    let mut segments: Vec<&str> = Vec::new();
    for (position, segment) in name.split(['/', '\\']).enumerate() {
        match segment {
            "" | "." => {},
            ".." => {
                segments.pop().ok_or_raise(invalid)?;
            },
            // NUL passes through `Path` on Unix but truncates the name in syscalls.
            _ if segment.contains('\0') => exn::bail!(invalid()),
            _ if position == 0 && is_drive(segment) => exn::bail!(invalid()),
            _ => segments.push(segment),
        }
    }
    match segments.is_empty() {
        true => exn::bail!(invalid()),
        false => Ok(segments.iter().collect()),
    }
}

fn is_drive(segment: &str) -> bool {
    matches!(segment.as_bytes(), [letter, b':'] if letter.is_ascii_alphabetic())
}

/// Check a path already inside the staging tree, resolving it the same way
/// as [`entry_path`]. Paths that aren't UTF-8 never came from a member name
/// and are rejected.
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let name = path.to_str().ok_or_raise(|| ErrorKind::InvalidPath(path.to_path_buf()))?;
    entry_path(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("mimetype", "mimetype")]
    #[case("META-INF/container.xml", "META-INF/container.xml")]
    #[case("OEBPS//Text//ch1.xhtml", "OEBPS/Text/ch1.xhtml")]
    #[case("OEBPS/./Text/./ch1.xhtml", "OEBPS/Text/ch1.xhtml")]
    #[case("OEBPS/Text/..", "OEBPS")]
    #[case("OEBPS/Styles/", "OEBPS/Styles")]
    #[case("/OEBPS/content.opf", "OEBPS/content.opf")]
    fn test_valid_paths(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(validate(input).unwrap(), Path::new(expected));
    }

    #[rstest]
    #[case("../etc/passwd")]
    #[case("OEBPS/../../b")]
    #[case("..")]
    #[case("../..")]
    #[case("a\0b")]
    #[case("\0")]
    #[case("")]
    #[case(".")]
    #[case("./.")]
    #[case("//")]
    #[case("C:/Windows/evil.dll")]
    #[case("c:\\evil.dll")]
    fn test_invalid_paths(#[case] input: &str) {
        let err = validate(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[rstest]
    #[case("OEBPS\\Images\\cover.jpg", "OEBPS/Images/cover.jpg")]
    #[case("OEBPS\\Text/ch1.xhtml", "OEBPS/Text/ch1.xhtml")]
    #[case("OEBPS/Text/ch1.xhtml", "OEBPS/Text/ch1.xhtml")]
    #[case("OEBPS\\Text\\..\\Styles\\main.css", "OEBPS/Styles/main.css")]
    #[case("OEBPS/C:/odd.xhtml", "OEBPS/C:/odd.xhtml")]
    fn test_entry_path_backslashes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(entry_path(input).unwrap(), Path::new(expected));
    }

    #[test]
    fn test_entry_path_traversal() {
        assert!(entry_path("OEBPS\\..\\..\\evil.sh").is_err());
        assert!(entry_path("..\\evil.sh").is_err());
    }
}
