mod cli;
mod discover;
mod error;
mod logging;
mod setup;

use crate::cli::Args;
use crate::error::ErrorKind;
use crate::setup::setup;
use clap::Parser;
use epubfix_pipeline::{Context, ProcessEvent, process, repackage};
use exn::ResultExt;
use futures::StreamExt;
use std::pin::pin;
use std::process::ExitCode;
use std::time::Instant;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let started = Instant::now();
    let args = Args::parse();
    logging::init(args.verbosity());

    let ctx = match std::env::current_dir()
        .or_raise(|| ErrorKind::WorkingDirectory)
        .and_then(|cwd| setup(&args, &cwd, started))
    {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!(error = ?e, "Startup failed");
            return ExitCode::FAILURE;
        },
    };

    run(&ctx).await;
    ExitCode::SUCCESS
}

/// Process every member of the source archive, then repackage it if nothing
/// failed. Failures from here on are logged, not returned.
async fn run(ctx: &Context) {
    let mut tally = None;
    let mut events = pin!(process(ctx));
    while let Some(event) = events.next().await {
        match event {
            Ok(ProcessEvent::Started) => tracing::info!(source = %ctx.source.display(), "Processing archive"),
            Ok(ProcessEvent::DiscoveryComplete(members)) => tracing::debug!(members, "Opened archive"),
            Ok(ProcessEvent::Staged(staged)) => {
                tracing::info!(member = %staged.name, route = %staged.route, bytes = staged.bytes, "Staged member");
            },
            Ok(ProcessEvent::Skipped(name)) => tracing::info!(member = %name, "Skipped member"),
            Ok(ProcessEvent::Complete(complete)) => tally = Some(complete),
            Err(e) => tracing::error!(error = ?e, "Member failed"),
        }
    }

    let Some(tally) = tally else {
        tracing::error!(
            staging = %ctx.staging.root().display(),
            "Processing did not finish; original archive left untouched"
        );
        return;
    };
    tracing::info!(
        staged = tally.staged,
        skipped = tally.skipped,
        failed = tally.failed,
        "Processing complete"
    );

    match repackage(ctx, &tally).await {
        Ok(report) => tracing::info!(
            archive = %report.archive.display(),
            backup = ?report.backup,
            members = report.members,
            bytes = report.bytes,
            elapsed = ?report.elapsed,
            "Repackaged archive"
        ),
        Err(e) => tracing::error!(error = ?e, staging = %ctx.staging.root().display(), "Repackaging failed"),
    }
}
