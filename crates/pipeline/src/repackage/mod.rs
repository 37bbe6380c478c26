//! Turning the staging tree back into an EPUB.
//!
//! Repackaging happens once per run, after [`process`](crate::process) has
//! reported its final [`Tally`]. In order:
//!
//! 1. Build the new archive in memory from the whole staging tree.
//! 2. Rename the original archive to its backup name.
//! 3. Write the new archive to the original path.
//! 4. Remove the staging tree.
//!
//! Steps 1 and 3 are fatal: the original (or its backup) stays where it is
//! and the staging tree is kept for inspection. Steps 2 and 4 are logged and
//! skipped when they fail.

mod backup;
pub mod error;

pub use self::backup::backup_path;
use crate::Context;
use crate::error::{ErrorKind as PipelineErrorKind, Result as PipelineResult};
use crate::process::Tally;
use crate::repackage::error::{ErrorKind, Result};
use epubfix_archive::pack;
use exn::ResultExt;
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tokio::task::spawn_blocking;
use tracing::instrument;

/// Summary of a successful repackaging.
#[derive(Clone, Debug)]
pub struct Report {
    /// Where the new archive was written (the original path).
    pub archive: PathBuf,
    /// Where the original archive was moved, unless that failed.
    pub backup: Option<PathBuf>,
    /// Members in the new archive.
    pub members: usize,
    /// Size of the new archive.
    pub bytes: u64,
    /// The staging tree, if it is still on disk.
    pub staging: Option<PathBuf>,
    /// Wall-clock time since the run started.
    pub elapsed: Duration,
}

/// Build a new archive from the staging tree and put it in place of
/// `ctx.source`, keeping the original as a backup.
///
/// # Errors
/// Returns [`Exn<PipelineErrorKind::Repackage>`](PipelineErrorKind::Repackage)
/// raised from an inner [`ErrorKind`]. Refuses to do anything unless `tally`
/// is complete.
#[instrument(skip_all, fields(source = %ctx.source.display()))]
pub async fn repackage(ctx: &Context, tally: &Tally) -> PipelineResult<Report> {
    repackage_inner(ctx, tally).await.or_raise(|| PipelineErrorKind::Repackage)
}

async fn repackage_inner(ctx: &Context, tally: &Tally) -> Result<Report> {
    if !tally.is_complete() {
        exn::bail!(ErrorKind::Incomplete);
    }

    let files = ctx.staging.list().await.or_raise(|| ErrorKind::Staging)?;
    let members = files.len();
    let root = ctx.staging.root().to_path_buf();
    let packed = {
        let root = root.clone();
        spawn_blocking(move || pack(Cursor::new(Vec::new()), &root, &files))
    };
    let archive = packed.await.or_raise(|| ErrorKind::Build)?.or_raise(|| ErrorKind::Build)?.into_inner();
    tracing::debug!(members, bytes = archive.len(), "Built new archive");

    let backup = match backup_path(&ctx.source, &ctx.backup_prefix).await {
        Ok(backup) => match fs::rename(&ctx.source, &backup).await {
            Ok(()) => {
                tracing::info!(backup = %backup.display(), "Kept original archive");
                Some(backup)
            },
            Err(e) => {
                tracing::warn!(error = %e, backup = %backup.display(), "Could not back up original archive");
                None
            },
        },
        Err(e) => {
            tracing::warn!(error = %e, "Could not pick a backup name for the original archive");
            None
        },
    };

    fs::write(&ctx.source, &archive).await.or_raise(|| ErrorKind::Write(ctx.source.clone()))?;

    let staging = match ctx.keep_staging {
        true => Some(root),
        false => match ctx.staging.remove().await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(error = ?e, staging = %root.display(), "Could not remove staging tree");
                Some(root)
            },
        },
    };

    Ok(Report {
        archive: ctx.source.clone(),
        backup,
        members,
        bytes: archive.len() as u64,
        staging,
        elapsed: ctx.started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ProcessEvent, process};
    use crate::testing::{self, CHAPTER, CONTAINER, COVER, MIMETYPE, OPF, member, read_archive};
    use epubfix_config::Config;
    use futures::StreamExt;

    async fn run(ctx: &Context) -> Tally {
        let mut stream = Box::pin(process(ctx));
        let mut tally = None;
        while let Some(event) = stream.next().await {
            if let ProcessEvent::Complete(complete) = event.unwrap() {
                tally = Some(complete);
            }
        }
        tally.unwrap()
    }

    #[tokio::test]
    async fn end_to_end() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ctx = testing::context(temp_dir.path(), &testing::config());
        testing::book(&ctx.source);
        let original = std::fs::read(&ctx.source).unwrap();

        let tally = run(&ctx).await;
        let report = repackage(&ctx, &tally).await.unwrap();

        assert_eq!(report.archive, ctx.source);
        assert_eq!(report.backup, Some(temp_dir.path().join("old-book.epub")));
        assert_eq!(report.members, 5);
        assert_eq!(report.staging, None);
        assert!(!ctx.staging.root().exists());
        assert_eq!(std::fs::read(temp_dir.path().join("old-book.epub")).unwrap(), original);

        let members = read_archive(&ctx.source);
        assert_eq!(members[0], ("mimetype".to_string(), MIMETYPE.to_vec()));
        assert_eq!(member(&members, "META-INF/container.xml").unwrap(), CONTAINER);
        assert_eq!(member(&members, "OEBPS/content.opf").unwrap(), OPF);
        assert_eq!(member(&members, "OEBPS/Images/cover.jpg").unwrap(), COVER);
        assert_eq!(
            member(&members, "OEBPS/Text/chapter1.xhtml").unwrap(),
            b"<html><body><p><i>Hello</i>, world</p></body></html>\n"
        );
        assert!(member(&members, "OEBPS/").is_none());
        assert_eq!(report.bytes, std::fs::read(&ctx.source).unwrap().len() as u64);
    }

    #[tokio::test]
    async fn running_twice_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = testing::config();
        let ctx = testing::context(temp_dir.path(), &config);
        testing::book(&ctx.source);
        let tally = run(&ctx).await;
        repackage(&ctx, &tally).await.unwrap();
        let first = std::fs::read(&ctx.source).unwrap();

        let ctx = testing::context(temp_dir.path(), &config);
        let tally = run(&ctx).await;
        let report = repackage(&ctx, &tally).await.unwrap();

        assert_eq!(report.backup, Some(temp_dir.path().join("old-2-book.epub")));
        assert_eq!(std::fs::read(temp_dir.path().join("old-2-book.epub")).unwrap(), first);
        assert_eq!(std::fs::read(&ctx.source).unwrap(), first);
        // The first backup is untouched.
        assert!(member(&read_archive(&temp_dir.path().join("old-book.epub")), "OEBPS/Text/chapter1.xhtml")
            .is_some_and(|chapter| chapter == CHAPTER));
    }

    #[tokio::test]
    async fn rerun_from_backup_is_byte_identical() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = testing::config();
        let ctx = testing::context(temp_dir.path(), &config);
        testing::book(&ctx.source);
        let tally = run(&ctx).await;
        let report = repackage(&ctx, &tally).await.unwrap();
        let first = std::fs::read(&ctx.source).unwrap();

        // Start over from the untouched original.
        let backup = report.backup.unwrap();
        std::fs::rename(&backup, &ctx.source).unwrap();
        let ctx = testing::context(temp_dir.path(), &config);
        let tally = run(&ctx).await;
        let report = repackage(&ctx, &tally).await.unwrap();

        assert_eq!(report.backup, Some(backup));
        assert_eq!(std::fs::read(&ctx.source).unwrap(), first);
    }

    #[tokio::test]
    async fn incomplete_tally_is_refused() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ctx = testing::context(temp_dir.path(), &Config::default());
        testing::book(&ctx.source);
        let original = std::fs::read(&ctx.source).unwrap();
        ctx.staging.write("OEBPS/content.opf".as_ref(), OPF).await.unwrap();

        let tally = Tally { seen: 2, staged: 1, skipped: 0, failed: 0, end_of_archive: true };
        let err = repackage(&ctx, &tally).await.unwrap_err();
        assert_eq!(*err, PipelineErrorKind::Repackage);

        assert_eq!(std::fs::read(&ctx.source).unwrap(), original);
        assert!(!temp_dir.path().join("old-book.epub").exists());
        assert_eq!(ctx.staging.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn keep_staging() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ctx = testing::context(temp_dir.path(), &Config::default()).with_keep_staging(true);
        testing::book(&ctx.source);
        let tally = run(&ctx).await;
        let report = repackage(&ctx, &tally).await.unwrap();
        assert_eq!(report.staging.as_deref(), Some(ctx.staging.root()));
        assert_eq!(ctx.staging.list().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn failed_backup_is_not_fatal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ctx = testing::context(temp_dir.path(), &Config::default());
        testing::book(&ctx.source);
        let tally = run(&ctx).await;
        // Nothing left to rename.
        std::fs::remove_file(&ctx.source).unwrap();

        let report = repackage(&ctx, &tally).await.unwrap();
        assert_eq!(report.backup, None);
        assert_eq!(member(&read_archive(&ctx.source), "OEBPS/Images/cover.jpg").unwrap(), COVER);
    }

    #[tokio::test]
    async fn custom_backup_prefix() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ctx = testing::context(temp_dir.path(), &Config::default()).with_backup_prefix("orig_");
        testing::book(&ctx.source);
        let tally = run(&ctx).await;
        let report = repackage(&ctx, &tally).await.unwrap();
        assert_eq!(report.backup, Some(temp_dir.path().join("orig_book.epub")));
    }
}
