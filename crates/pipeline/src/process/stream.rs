use crate::error::{ErrorKind as PipelineErrorKind, Result as PipelineResult};
use crate::process::error::{ErrorKind, Result};
use crate::process::reader::{Message, Outcome, Text, read_entries};
use crate::process::{Route, Tally};
use crate::{Context, MAX_PROCESS_CONCURRENCY};
use async_stream::stream;
use epubfix_archive::Archive;
use exn::{OptionExt, ResultExt};
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::spawn_blocking;

/// A member written to the staging tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Staged {
    /// Position of the member in the source archive.
    pub index: usize,
    /// Member name as found in the archive, with `/` separators.
    pub name: String,
    /// Where it was staged, relative to the staging root.
    pub path: PathBuf,
    pub route: Route,
    /// Bytes written.
    pub bytes: u64,
}

/// Progress events emitted by [`process`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete): exactly once, with the
///    number of entries in the archive.
/// 3. [`Staged`](Self::Staged) or [`Skipped`](Self::Skipped): once per
///    member that settled without error, in no particular order.
/// 4. [`Complete`](Self::Complete): exactly once, when every member has
///    settled.
///
/// Members that fail are reported as `Err` items in step 3 without ending the
/// stream. Failing to open the archive, or the reader stopping before the end
/// of the archive, ends the stream without [`Complete`](Self::Complete).
#[derive(Debug)]
pub enum ProcessEvent {
    Started,
    DiscoveryComplete(u64),
    Staged(Staged),
    /// A directory entry; nothing was staged.
    Skipped(String),
    /// The completion barrier has been reached. The tally is final.
    Complete(Tally),
}

enum Step {
    Received(Option<Message>),
    Transformed(Result<Staged>),
}

/// Streams [`ProcessEvent`]s while every member of `ctx.source` is classified
/// and staged under `ctx.staging`.
pub fn process(ctx: &Context) -> impl Stream<Item = PipelineResult<ProcessEvent>> + '_ {
    stream! {
        for await event in process_inner(ctx) {
            yield event.or_raise(|| PipelineErrorKind::Process);
        }
    }
}

fn process_inner(ctx: &Context) -> impl Stream<Item = Result<ProcessEvent>> + '_ {
    stream!({
        yield Ok(ProcessEvent::Started);

        let source = ctx.source.clone();
        let archive = match spawn_blocking(move || Archive::open(source)).await.or_raise(|| ErrorKind::Open) {
            Ok(Ok(archive)) => archive,
            Ok(Err(e)) => {
                yield Err(e.raise(ErrorKind::Open));
                return;
            },
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        yield Ok(ProcessEvent::DiscoveryComplete(u64::try_from(archive.len()).unwrap_or(0)));

        let (tx, mut rx) = mpsc::channel(MAX_PROCESS_CONCURRENCY);
        let staging = ctx.staging.clone();
        let reader = spawn_blocking(move || read_entries(archive, &staging, &tx));

        let mut tally = Tally::default();
        let mut transforming = FuturesUnordered::new();
        let mut receiving = true;
        loop {
            // `yield` can't be used inside `select!`.
            let step = tokio::select! {
                message = rx.recv(), if receiving && transforming.len() < MAX_PROCESS_CONCURRENCY => {
                    Step::Received(message)
                },
                Some(result) = transforming.next(), if !transforming.is_empty() => Step::Transformed(result),
                else => break,
            };
            match step {
                Step::Received(None) => receiving = false,
                Step::Received(Some(Message::End)) => tally.end_of_archive = true,
                Step::Received(Some(Message::Text(text))) => {
                    tally.seen += 1;
                    transforming.push(transform(ctx, text));
                },
                Step::Received(Some(Message::Settled(Ok(Outcome::Staged(staged))))) => {
                    tally.seen += 1;
                    tally.staged += 1;
                    yield Ok(ProcessEvent::Staged(staged));
                },
                Step::Received(Some(Message::Settled(Ok(Outcome::Skipped(name))))) => {
                    tally.seen += 1;
                    tally.skipped += 1;
                    yield Ok(ProcessEvent::Skipped(name));
                },
                Step::Received(Some(Message::Settled(Err(e)))) => {
                    tally.seen += 1;
                    tally.failed += 1;
                    yield Err(e);
                },
                Step::Transformed(Ok(staged)) => {
                    tally.staged += 1;
                    yield Ok(ProcessEvent::Staged(staged));
                },
                Step::Transformed(Err(e)) => {
                    tally.failed += 1;
                    yield Err(e);
                },
            }
        }

        // The reader only panics on a bug; either way the walk is over.
        if let Err(e) = reader.await {
            tracing::error!(error = %e, "Archive reader panicked");
        }
        match tally.is_complete() {
            true => yield Ok(ProcessEvent::Complete(tally)),
            false => {
                tracing::error!(?tally, "Processing stopped before every member settled");
                yield Err(exn::Exn::from(ErrorKind::Reader));
            },
        }
    })
}

/// Run a text member through its pipeline and stage the result. The
/// pipeline runs on the blocking pool so a panicking transform only costs
/// this member.
async fn transform(ctx: &Context, text: Text) -> Result<Staged> {
    let Text { index, name, path, file_type, doc } = text;
    let pipeline = ctx.pipelines.get(file_type).cloned().ok_or_raise(|| ErrorKind::Transform(name.clone()))?;
    let output = spawn_blocking(move || pipeline.apply(doc)).await.or_raise(|| ErrorKind::Transform(name.clone()))?;
    ctx.staging.write(&path, output.as_bytes()).await.or_raise(|| ErrorKind::Stage(name.clone()))?;
    tracing::debug!(index, name = %name, "Transformed member");
    Ok(Staged { index, name, path, route: Route::Transform(file_type), bytes: output.len() as u64 })
}
