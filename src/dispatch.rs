//! Runs the paged fetch over every window with a bounded number of concurrent tasks.

use crate::fetching::page_source::PageSource;
use crate::fetching::paged_fetcher::{PagedFetcher, WindowFetch};
use crate::normalize::normalize_record;
use crate::output::csv_sink::CsvSink;
use crate::output::error::OutputError;
use crate::types::date_window::DateWindow;
use crate::types::progress::{FetchProgress, ProgressSnapshot};
use futures_util::stream::{self, StreamExt};
use log::{error, info, warn};
use serde::Serialize;
use std::sync::Arc;

/// Totals of one dispatcher run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HarvestReport {
    /// Windows dispatched.
    pub windows: usize,
    /// Windows that produced at least one row.
    pub windows_with_data: usize,
    /// Windows that ended on a failure: a page out of retries, a failed write or a crashed task.
    pub windows_failed: usize,
    /// Rows appended to the output file across all windows.
    pub records_written: usize,
    /// Progress counter as it stood when the last task was collected.
    pub progress: ProgressSnapshot,
}

/// What a single window task reports back.
#[derive(Debug)]
struct WindowOutcome {
    written: usize,
    complete: bool,
}

/// Fans window fetches out over a bounded pool and appends their rows to one sink.
pub struct Dispatcher<S> {
    fetcher: Arc<PagedFetcher<S>>,
    sink: Arc<CsvSink>,
    max_workers: usize,
}

impl<S: PageSource + 'static> Dispatcher<S> {
    pub fn new(fetcher: PagedFetcher<S>, sink: CsvSink, max_workers: usize) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            sink: Arc::new(sink),
            max_workers: max_workers.max(1),
        }
    }

    /// Fetches, normalizes and writes every window.
    ///
    /// At most `max_workers` windows are in flight at once and windows finish
    /// in any order. A window that fails, or whose task panics, is logged and
    /// counted in [`HarvestReport::windows_failed`]; it never stops the others.
    ///
    /// Every task that finishes, with or without data, advances `progress`
    /// once. A task that panics does not.
    pub async fn run(&self, windows: Vec<DateWindow>, progress: Arc<FetchProgress>) -> HarvestReport {
        let mut report = HarvestReport {
            windows: windows.len(),
            windows_with_data: 0,
            windows_failed: 0,
            records_written: 0,
            progress: progress.snapshot(),
        };

        let mut results = stream::iter(windows)
            .map(|window| {
                let fetcher = Arc::clone(&self.fetcher);
                let sink = Arc::clone(&self.sink);
                let progress = Arc::clone(&progress);
                let handle = tokio::spawn(async move {
                    let outcome = process_window(&fetcher, &sink, window).await;
                    info!("Progress: {}", progress.complete_one());
                    outcome
                });
                async move { (window, handle.await) }
            })
            .buffer_unordered(self.max_workers);

        while let Some((window, joined)) = results.next().await {
            match joined {
                Ok(Ok(outcome)) => {
                    report.records_written += outcome.written;
                    if outcome.written > 0 {
                        report.windows_with_data += 1;
                    }
                    if !outcome.complete {
                        report.windows_failed += 1;
                    }
                }
                Ok(Err(e)) => {
                    error!("[{}] failed to write rows: {}", window, e);
                    report.windows_failed += 1;
                }
                Err(e) => {
                    error!("[{}] task failed: {}", window, e);
                    report.windows_failed += 1;
                }
            }
        }

        report.progress = progress.snapshot();
        info!(
            "Finished {} windows: {} records written to {}",
            report.windows,
            report.records_written,
            self.sink.path().display()
        );
        report
    }
}

async fn process_window<S: PageSource>(
    fetcher: &PagedFetcher<S>,
    sink: &CsvSink,
    window: DateWindow,
) -> Result<WindowOutcome, OutputError> {
    let fetch: WindowFetch = fetcher.fetch_window(window).await;
    let complete = fetch.is_complete();
    let schema = fetcher.source().schema;
    let rows: Vec<_> = fetch
        .records
        .iter()
        .map(|raw| normalize_record(raw, schema))
        .collect();

    if rows.is_empty() {
        warn!("[{}] no data", window);
        return Ok(WindowOutcome {
            written: 0,
            complete,
        });
    }
    let written = sink.append(&rows).await?;
    info!("[{}] wrote {} rows", window, written);
    Ok(WindowOutcome { written, complete })
}
