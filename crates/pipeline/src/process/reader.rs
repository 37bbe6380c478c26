//! The blocking half of [`process`](super::process): walks the archive in
//! order and settles everything that doesn't need a pipeline.

use crate::process::Route;
use crate::process::error::{ErrorKind, Result};
use crate::process::stream::Staged;
use epubfix_archive::{Archive, Entry};
use epubfix_storage::{StagingArea, entry_path};
use epubfix_transform::FileType;
use exn::ResultExt;
use std::io::{Read, Seek};
use std::ops::ControlFlow;
use std::path::PathBuf;
use tokio::sync::mpsc::Sender;

/// A decoded text member waiting for its pipeline.
pub(super) struct Text {
    pub index: usize,
    pub name: String,
    pub path: PathBuf,
    pub file_type: FileType,
    pub doc: String,
}

pub(super) enum Outcome {
    Staged(Staged),
    Skipped(String),
}

pub(super) enum Message {
    /// A member that settled on the reader thread, successfully or not.
    Settled(Result<Outcome>),
    Text(Text),
    /// Every member has been read.
    End,
}

/// Visit every member of `archive`, sending one message per member followed
/// by [`Message::End`]. Stops early if the receiving side goes away.
pub(super) fn read_entries<R: Read + Seek>(mut archive: Archive<R>, staging: &StagingArea, tx: &Sender<Message>) {
    let mut disconnected = false;
    archive.visit(|index, entry| {
        let message = match entry {
            Ok(entry) => read_entry(index, entry, staging).unwrap_or_else(|err| Message::Settled(Err(err))),
            Err(err) => Message::Settled(Err(err.raise(ErrorKind::Read(format!("#{index}"))))),
        };
        match tx.blocking_send(message) {
            Ok(()) => ControlFlow::Continue(()),
            Err(_) => {
                disconnected = true;
                ControlFlow::Break(())
            },
        }
    });
    if !disconnected {
        let _ = tx.blocking_send(Message::End);
    }
}

fn read_entry(index: usize, entry: Entry<'_>, staging: &StagingArea) -> Result<Message> {
    let route = Route::classify(&entry.name, entry.is_dir);
    tracing::debug!(index, name = %entry.name, size = entry.size, %route, "Read member");
    let name = entry.name;
    if route == Route::Skip {
        return Ok(Message::Settled(Ok(Outcome::Skipped(name))));
    }
    let path = entry_path(&name).or_raise(|| ErrorKind::InvalidPath(name.clone()))?;
    match route {
        Route::Transform(file_type) => {
            let mut buffer = Vec::new();
            entry.reader.read_to_end(&mut buffer).or_raise(|| ErrorKind::Read(name.clone()))?;
            let doc = String::from_utf8(buffer).or_raise(|| ErrorKind::Decode(name.clone()))?;
            Ok(Message::Text(Text { index, name, path, file_type, doc }))
        },
        Route::Copy | Route::Passthrough | Route::Skip => {
            let bytes = staging.copy_from(&path, entry.reader).or_raise(|| ErrorKind::Stage(name.clone()))?;
            Ok(Message::Settled(Ok(Outcome::Staged(Staged { index, name, path, route, bytes }))))
        },
    }
}
