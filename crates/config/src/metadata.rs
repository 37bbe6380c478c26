use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::instrument;

/// Arbitrary key/value metadata for a single book.
pub type Metadata = BTreeMap<String, String>;

/// The identifier a book's metadata is keyed by: the archive's file name
/// without its `.epub` extension.
///
/// ```
/// use epubfix_config::book_id;
/// assert_eq!(book_id("library/My Book.epub"), "My Book");
/// assert_eq!(book_id("notes.txt"), "notes.txt");
/// ```
pub fn book_id(source: impl AsRef<Path>) -> String {
    let source = source.as_ref();
    let is_epub = source.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("epub"));
    let name = if is_epub { source.file_stem() } else { source.file_name() };
    name.map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Read the first data row of a metadata CSV, keyed by the header row.
///
/// Rows may be ragged; missing trailing cells are simply absent from the
/// result. A file with a header but no data rows yields empty metadata.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn read_csv_row(path: impl AsRef<Path>) -> Result<Metadata> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .or_raise(|| ErrorKind::Csv(path.to_path_buf()))?;
    let headers = reader.headers().or_raise(|| ErrorKind::Csv(path.to_path_buf()))?.clone();
    let Some(record) = reader.records().next() else {
        tracing::warn!("Metadata CSV contains no data rows");
        return Ok(Metadata::new());
    };
    let record = record.or_raise(|| ErrorKind::Csv(path.to_path_buf()))?;
    Ok(headers.iter().zip(record.iter()).map(|(k, v)| (k.to_string(), v.to_string())).collect())
}
