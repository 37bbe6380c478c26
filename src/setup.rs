use crate::cli::Args;
use crate::discover::{find_metadata, find_source};
use crate::error::{ErrorKind, Result};
use epubfix_config::{Config, book_id, read_csv_row};
use epubfix_pipeline::Context;
use epubfix_storage::StagingArea;
use epubfix_transform::Pipelines;
use exn::{OptionExt, ResultExt};
use std::path::Path;
use std::time::Instant;
use tracing::instrument;

/// Resolve everything a run needs, relative to the working directory `cwd`:
/// the configuration, the source archive, the book's metadata, its composed
/// pipelines and an empty staging directory.
///
/// Any failure here is fatal; nothing has been touched yet.
#[instrument(skip_all, fields(cwd = %cwd.display()))]
pub fn setup(args: &Args, cwd: &Path, started: Instant) -> Result<Context> {
    let config = Config::load(cwd.join(&args.config)).or_raise(|| ErrorKind::Config)?;

    let source = match &args.source {
        Some(source) => cwd.join(source),
        None => find_source(cwd, &config.backup_prefix)?.ok_or_raise(|| ErrorKind::NoSource(cwd.to_path_buf()))?,
    };
    if !source.is_file() {
        exn::bail!(ErrorKind::SourceNotFound(source));
    }

    let book = book_id(&source);
    let csv_row = match find_metadata(cwd)? {
        Some(csv) => {
            tracing::info!(csv = %csv.display(), "Reading book metadata");
            Some(read_csv_row(&csv).or_raise(|| ErrorKind::Metadata)?)
        },
        None => None,
    };
    let metadata = config.book_metadata(&book, csv_row);
    tracing::debug!(book = %book, ?metadata, "Resolved book metadata");

    let pipelines = Pipelines::build(&config, &metadata).or_raise(|| ErrorKind::Pipelines)?;
    let staging = StagingArea::new(cwd.join(&config.staging)).or_raise(|| ErrorKind::Staging)?;

    Ok(Context::new(source, staging, pipelines)
        .with_backup_prefix(config.backup_prefix)
        .with_keep_staging(args.keep_staging)
        .with_started(started))
}
