use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs::File;
use std::io::{BufReader, ErrorKind as IoErrorKind, Read, Seek};
use std::ops::ControlFlow;
use std::path::Path;
use tracing::instrument;
use zip::ZipArchive;

/// A single member of an archive, as handed to an [`Archive::visit`] visitor.
pub struct Entry<'a> {
    /// Member name with `\` separators replaced by `/`. Not validated: it may
    /// still try to escape whatever directory it gets extracted to.
    pub name: String,
    pub is_dir: bool,
    /// Uncompressed size, as declared by the archive.
    pub size: u64,
    /// The decompressed contents. Only valid for the duration of the visit.
    pub reader: &'a mut dyn Read,
}

/// An open zip container.
pub struct Archive<R> {
    inner: ZipArchive<R>,
}
impl Archive<BufReader<File>> {
    /// Open the archive at `path` and read its central directory.
    ///
    /// # Errors
    /// - [`ErrorKind::NotFound`] if there is no file at `path`.
    /// - [`ErrorKind::InvalidArchive`] if it isn't a readable zip container.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == IoErrorKind::NotFound => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Err(err) => return Err(err).or_raise(|| ErrorKind::Io),
        };
        Self::new(BufReader::new(file))
    }
}
impl<R: Read + Seek> Archive<R> {
    pub fn new(reader: R) -> Result<Self> {
        let inner = ZipArchive::new(reader).or_raise(|| ErrorKind::InvalidArchive)?;
        Ok(Self { inner })
    }

    /// Number of entries, directories included.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }

    /// Hand every entry to `visitor`, one at a time and in archive order,
    /// along with its zero-based index. An entry that can't be opened is
    /// passed as an error and the walk carries on; the visitor stops the walk
    /// early by returning [`ControlFlow::Break`].
    ///
    /// Returns the number of entries visited.
    pub fn visit<F>(&mut self, mut visitor: F) -> usize
    where
        F: FnMut(usize, Result<Entry<'_>>) -> ControlFlow<()>,
    {
        for index in 0..self.inner.len() {
            let flow = match self.inner.by_index(index) {
                Ok(mut file) => {
                    let name = normalize_name(file.name());
                    let entry = Entry {
                        is_dir: file.is_dir() || name.ends_with('/'),
                        size: file.size(),
                        name,
                        reader: &mut file,
                    };
                    visitor(index, Ok(entry))
                },
                Err(err) => visitor(index, Err(err).or_raise(|| ErrorKind::InvalidEntry(index))),
            };
            if flow.is_break() {
                return index + 1;
            }
        }
        self.inner.len()
    }
}

fn normalize_name(name: &str) -> String {
    name.replace('\\', "/")
}
