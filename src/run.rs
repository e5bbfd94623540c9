//! Application execution logic.
//!
//! This module contains the main async loop that feeds events and
//! scheduled ticks into the dispatcher.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;

use http_dispatch::agent::{Dispatcher, EventSink, JsonLinesSink, RecordLog};
use http_dispatch::config::{EventSource, ValidatedConfig};
use http_dispatch::event::{Event, FileProvider};
use http_dispatch::template::TemplateResolver;
use http_dispatch::transport::{HttpClient, HttpError, ReqwestClient};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to construct the HTTP client.
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] HttpError),

    /// Failed to open the event file.
    #[error("Failed to open event file '{}': {source}", path.display())]
    EventFile {
        /// Path that was opened
        path: std::path::PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Reading event input failed.
    #[error("Failed to read events: {0}")]
    EventRead(#[source] std::io::Error),
}

/// Counts of what the loop handled, reported at shutdown.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct RunSummary {
    events: usize,
    scheduled: usize,
    failed: usize,
    skipped: usize,
}

/// Boxed line reader over stdin or a file.
type EventReader = Box<dyn AsyncBufRead + Unpin + Send>;

/// Executes the main application loop.
///
/// This function:
/// 1. Creates the HTTP client from the transport settings
/// 2. Creates the dispatcher writing events to stdout
/// 3. Runs one scheduled check (with `--once`), or
/// 4. Feeds event lines and scheduled ticks until input ends or a
///    shutdown signal (Ctrl+C) arrives
///
/// # Errors
///
/// Returns an error if:
/// - The HTTP client cannot be created
/// - The event file cannot be opened or read
///
/// # Coverage Note
///
/// This function is excluded from coverage because it requires:
/// - Real stdin/stdout
/// - Real async runtime with signal handling
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<(), RunError> {
    let client = ReqwestClient::with_settings(config.client).map_err(RunError::Client)?;
    let dispatcher = Dispatcher::new(config.agent, client, JsonLinesSink::stdout());

    if config.once {
        tracing::info!("Running a single scheduled check");
        dispatcher.on_schedule().await;
        return Ok(());
    }

    let input = match config.events {
        Some(source) => Some(open_events(&source).await?),
        None => None,
    };

    if let Some(period) = config.interval {
        tracing::info!("Scheduled checks every {}s", period.as_secs());
    }

    let summary = run_loop(&dispatcher, input, config.interval, shutdown_signal()).await?;
    tracing::info!(
        "Stopped after {} event(s) and {} scheduled check(s); {} failed, {} skipped",
        summary.events,
        summary.scheduled,
        summary.failed,
        summary.skipped
    );
    Ok(())
}

/// Opens the configured event input.
///
/// Excluded from coverage - reads real stdin.
#[cfg(not(tarpaulin_include))]
async fn open_events(source: &EventSource) -> Result<EventReader, RunError> {
    tracing::info!("Reading events from {source}");
    match source {
        EventSource::Stdin => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
        EventSource::File(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|source| RunError::EventFile {
                    path: path.clone(),
                    source,
                })?;
            Ok(Box::new(BufReader::new(file)))
        }
    }
}

/// Drives the dispatcher until shutdown.
///
/// Event lines are handled one at a time as they arrive. Scheduled checks
/// share the same loop, so a check never overlaps an event cycle. The loop
/// returns when `shutdown` completes, or when input ends and no schedule is
/// configured.
async fn run_loop<H, E, R, F, L, In, S>(
    dispatcher: &Dispatcher<H, E, R, F, L>,
    input: Option<In>,
    interval: Option<Duration>,
    shutdown: S,
) -> Result<RunSummary, RunError>
where
    H: HttpClient,
    E: EventSink,
    R: TemplateResolver,
    F: FileProvider,
    L: RecordLog,
    In: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = input.map(|reader| LinesStream::new(reader.lines()));
    let mut ticker = interval.map(schedule);
    let mut summary = RunSummary::default();

    tokio::pin!(shutdown);

    loop {
        if lines.is_none() && ticker.is_none() {
            return Ok(summary);
        }

        tokio::select! {
            biased;

            () = &mut shutdown => {
                tracing::info!("Shutdown signal received, stopping...");
                return Ok(summary);
            }

            line = next_line(&mut lines), if lines.is_some() => {
                match line {
                    Some(Ok(line)) => handle_line(dispatcher, &line, &mut summary).await,
                    Some(Err(e)) => return Err(RunError::EventRead(e)),
                    None => {
                        tracing::debug!("Event input ended");
                        lines = None;
                    }
                }
            }

            () = next_tick(&mut ticker), if ticker.is_some() => {
                summary.scheduled += 1;
                if !dispatcher.on_schedule().await.is_responded() {
                    summary.failed += 1;
                }
            }
        }
    }
}

/// Creates the schedule ticker; the first check runs one period after start.
fn schedule(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn next_line<In: AsyncBufRead + Unpin>(
    lines: &mut Option<LinesStream<In>>,
) -> Option<std::io::Result<String>> {
    match lines {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Parses and dispatches one input line. Unparseable lines are skipped.
async fn handle_line<H, E, R, F, L>(
    dispatcher: &Dispatcher<H, E, R, F, L>,
    line: &str,
    summary: &mut RunSummary,
) where
    H: HttpClient,
    E: EventSink,
    R: TemplateResolver,
    F: FileProvider,
    L: RecordLog,
{
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    match Event::from_line(line) {
        Ok(event) => {
            summary.events += 1;
            if !dispatcher.receive(&event).await.is_responded() {
                summary.failed += 1;
            }
        }
        Err(e) => {
            tracing::warn!("Skipping unparseable event line: {e}");
            summary.skipped += 1;
        }
    }
}

/// Returns a future that completes when a shutdown signal is received.
///
/// A handler that cannot be installed never fires; the other one still can.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
