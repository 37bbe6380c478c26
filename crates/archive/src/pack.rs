use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use std::fs::File;
use std::io::{Seek, Write};
use std::path::{Component, Path, PathBuf};
use tracing::instrument;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Name of the member declaring an EPUB's media type. It has to be the first
/// member of the container, stored uncompressed.
pub const MIMETYPE: &str = "mimetype";

/// The name a relative path gets inside an archive: its components joined
/// with `/`, whatever the platform separator.
pub fn entry_name(path: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str().ok_or_raise(|| ErrorKind::InvalidName(path.to_path_buf()))?;
                parts.push(part);
            },
            _ => exn::bail!(ErrorKind::InvalidName(path.to_path_buf())),
        }
    }
    match parts.is_empty() {
        true => exn::bail!(ErrorKind::InvalidName(path.to_path_buf())),
        false => Ok(parts.join("/")),
    }
}

/// Pack `files` (relative to `root`) into a new zip container written to
/// `writer`, returning the writer once the central directory is written.
///
/// `mimetype` goes first and is stored; every other member follows in sorted
/// order and is deflated. Timestamps and permissions are fixed, so packing
/// the same tree twice yields identical bytes.
///
/// Directories aren't given entries of their own; they are implied by the
/// members inside them.
#[instrument(skip_all, fields(root = %root.display(), files = files.len()))]
pub fn pack<W: Write + Seek>(writer: W, root: &Path, files: &[PathBuf]) -> Result<W> {
    let mut members = files
        .iter()
        .map(|path| Ok((entry_name(path)?, path)))
        .collect::<Result<Vec<_>>>()?;
    members.sort_by(|(a, _), (b, _)| (a != MIMETYPE, a).cmp(&(b != MIMETYPE, b)));
    if members.first().is_none_or(|(name, _)| name != MIMETYPE) {
        tracing::warn!("No `{MIMETYPE}` member; EPUB readers may reject the archive");
    }

    let base = SimpleFileOptions::default().last_modified_time(DateTime::default()).unix_permissions(0o644);
    let mut zip = ZipWriter::new(writer);
    for (name, path) in members {
        let method = match name == MIMETYPE {
            true => CompressionMethod::Stored,
            false => CompressionMethod::Deflated,
        };
        let mut file = File::open(root.join(path)).or_raise(|| ErrorKind::Io)?;
        zip.start_file(name.clone(), base.compression_method(method)).or_raise(|| ErrorKind::Io)?;
        let bytes = std::io::copy(&mut file, &mut zip).or_raise(|| ErrorKind::Io)?;
        tracing::trace!(member = %name, bytes, "Packed member");
    }
    let writer = zip.finish().or_raise(|| ErrorKind::Io)?;
    Ok(writer)
}
