use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_path;
use async_stream::stream;
use exn::ResultExt;
use futures::{Stream, TryStreamExt};
use std::fs::{File as SyncFile, create_dir_all as sync_create_dir};
use std::io::{Error as IoError, ErrorKind as IoErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs::{self, DirEntry};
use tokio::io::AsyncWriteExt;

pub type StagedFileStream<'a> = Pin<Box<dyn Stream<Item = Result<PathBuf>> + Send + 'a>>;

enum WalkEntry {
    File(PathBuf),
    Descend(PathBuf),
    Skip,
}

fn map_io_error(e: IoError, path: &Path) -> ErrorKind {
    match e.kind() {
        IoErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
        IoErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
        _ => ErrorKind::Io(e),
    }
}

/// A directory that mirrors the folder structure of an archive.
///
/// Every path handed to a staging area is relative to its root and is
/// validated first, so a member can never be written outside of it. Writes
/// to different paths may run concurrently; missing parent directories are
/// created on demand and a directory created by a concurrent write counts as
/// success.
///
/// # Examples
///
/// ```no_run
/// use epubfix_storage::StagingArea;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let staging = StagingArea::new("out")?;
/// staging.write("OEBPS/Text/chapter1.xhtml".as_ref(), b"<html/>").await?;
/// assert_eq!(staging.list().await?.len(), 1);
/// staging.remove().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct StagingArea {
    root: PathBuf,
}
impl StagingArea {
    /// Prepare a staging area, creating `root` if it doesn't exist. Relative
    /// roots resolve against the working directory.
    ///
    /// # Errors
    /// - [`ErrorKind::InvalidRoot`] if `root` exists but is not a directory.
    /// - [`ErrorKind::NotEmpty`] if `root` already contains anything: those
    ///   files would otherwise end up in the repackaged archive.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let root = std::path::absolute(root).or_raise(|| ErrorKind::InvalidRoot(root.to_path_buf()))?;
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidRoot(root));
            }
            let mut entries = std::fs::read_dir(&root).map_err(|e| map_io_error(e, &root))?;
            if entries.next().is_some() {
                exn::bail!(ErrorKind::NotEmpty(root));
            }
        } else {
            // Non-async: happens once, before anything is staged.
            sync_create_dir(&root).map_err(|e| map_io_error(e, &root))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate `path` and join it onto the root, returning both the
    /// normalized relative path and the absolute one.
    fn resolve(&self, path: &Path) -> Result<(PathBuf, PathBuf)> {
        let relative = validate_path(path)?;
        let absolute = self.root.join(&relative);
        Ok((relative, absolute))
    }

    /// Write `data` to `path`, creating parent directories as needed. Only
    /// returns once the data has been flushed. A failed write doesn't leave a
    /// partial file behind.
    pub async fn write(&self, path: &Path, data: &[u8]) -> Result<PathBuf> {
        let (relative, absolute) = self.resolve(path)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await.map_err(|e| map_io_error(e, &relative))?;
        }
        let mut file = fs::File::create(&absolute).await.map_err(|e| map_io_error(e, &relative))?;
        let written = async {
            file.write_all(data).await?;
            file.flush().await
        };
        if let Err(err) = written.await {
            drop(file);
            let _ = fs::remove_file(&absolute).await;
            exn::bail!(ErrorKind::Io(err));
        }
        Ok(relative)
    }

    /// Stream everything `reader` yields into `path` without buffering it in
    /// memory, returning the number of bytes written.
    ///
    /// Blocking. Meant to be called from the thread that owns `reader`.
    pub fn copy_from(&self, path: &Path, mut reader: impl Read) -> Result<u64> {
        let (relative, absolute) = self.resolve(path)?;
        if let Some(parent) = absolute.parent() {
            sync_create_dir(parent).map_err(|e| map_io_error(e, &relative))?;
        }
        let mut file = SyncFile::create(&absolute).map_err(|e| map_io_error(e, &relative))?;
        let copied = std::io::copy(&mut reader, &mut file).and_then(|bytes| file.flush().map(|()| bytes));
        match copied {
            Ok(bytes) => Ok(bytes),
            Err(err) => {
                drop(file);
                let _ = std::fs::remove_file(&absolute);
                exn::bail!(ErrorKind::Io(err))
            },
        }
    }

    async fn walk_entry(&self, entry: DirEntry) -> Result<WalkEntry> {
        let path = entry.path();
        let file_type = entry.file_type().await.map_err(|e| map_io_error(e, &path))?;
        if file_type.is_dir() {
            return Ok(WalkEntry::Descend(path));
        }
        if file_type.is_file() {
            let relative = path
                .strip_prefix(&self.root)
                .or_raise(|| ErrorKind::InvalidPath(path.clone()))?;
            return Ok(WalkEntry::File(validate_path(relative)?));
        }
        // Symlinks and other special files are never staged by us.
        Ok(WalkEntry::Skip)
    }

    /// Every staged file as a path relative to the root, in no particular
    /// order. A missing root yields nothing.
    pub fn list_stream(&self) -> StagedFileStream<'_> {
        let mut stack = vec![self.root.clone()];
        Box::pin(stream! {
            'dirs: while let Some(current) = stack.pop() {
                let mut entries = match fs::read_dir(&current).await {
                    Ok(entries) => entries,
                    Err(err) if err.kind() == IoErrorKind::NotFound => continue,
                    Err(err) => {
                        yield Err(exn::Exn::from(map_io_error(err, &current)));
                        continue 'dirs;
                    }
                };
                'entries: loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break 'entries,
                        Err(e) => { yield Err(exn::Exn::from(map_io_error(e, &current))); continue 'entries; },
                    };
                    match self.walk_entry(entry).await {
                        Ok(WalkEntry::File(f)) => yield Ok(f),
                        Ok(WalkEntry::Descend(d)) => stack.push(d),
                        Ok(WalkEntry::Skip) => {},
                        Err(e) => yield Err(e),
                    };
                }
            }
        })
    }

    /// Every staged file, sorted. Fails on the first unreadable directory.
    pub async fn list(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = self.list_stream().try_collect().await?;
        files.sort();
        Ok(files)
    }

    /// Delete the staging tree, root included. Removing a tree that is
    /// already gone succeeds.
    pub async fn remove(&self) -> Result<()> {
        match fs::remove_dir_all(&self.root).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == IoErrorKind::NotFound => Ok(()),
            Err(err) => exn::bail!(map_io_error(err, &self.root)),
        }
    }
}
