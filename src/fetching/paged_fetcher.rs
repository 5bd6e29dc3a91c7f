use crate::fetching::page_source::{PageQuery, PageSource};
use crate::fetching::retry::RetryPolicy;
use crate::types::data_source::DataSource;
use crate::types::date_window::DateWindow;
use crate::types::record::RawRecord;
use crate::types::roc_date::to_roc;
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;

/// Why paging a window stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEnd {
    /// A page held fewer records than requested: the normal end of data.
    ShortPage,
    /// Upstream answered with an empty list.
    EmptyPage,
    /// Upstream answered with something other than a list.
    NotAList,
    /// A page kept failing; records after it were not fetched.
    RetriesExhausted,
}

/// Records gathered for one window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowFetch {
    pub window: DateWindow,
    /// Kept records, in upstream page order.
    pub records: Vec<RawRecord>,
    pub pages: usize,
    /// Items seen across all pages, before filtering.
    pub seen: usize,
    pub end: PageEnd,
}

impl WindowFetch {
    /// `false` if paging stopped on a failure rather than on end of data.
    pub fn is_complete(&self) -> bool {
        self.end != PageEnd::RetriesExhausted
    }
}

/// Pages through one window of a [`DataSource`], keeping the records its filters accept.
pub struct PagedFetcher<S> {
    pages: Arc<S>,
    source: Arc<DataSource>,
    page_size: usize,
    retry: RetryPolicy,
}

impl<S: PageSource> PagedFetcher<S> {
    pub fn new(pages: Arc<S>, source: Arc<DataSource>, page_size: usize, retry: RetryPolicy) -> Self {
        Self {
            pages,
            source,
            page_size,
            retry,
        }
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn pages(&self) -> &S {
        &self.pages
    }

    /// Fetches every page of `window` until a short, empty or non-list page.
    ///
    /// Never fails. A page that still fails after the retry budget ends the
    /// window early; records from earlier pages are kept.
    pub async fn fetch_window(&self, window: DateWindow) -> WindowFetch {
        info!(
            "Fetching {} ({} ~ {}) from {}",
            window,
            to_roc(window.start),
            to_roc(window.end),
            self.source.name
        );
        let mut fetch = WindowFetch {
            window,
            records: Vec::new(),
            pages: 0,
            seen: 0,
            end: PageEnd::ShortPage,
        };
        let mut query = PageQuery::first(window, self.page_size);

        loop {
            let label = format!("{} skip {}", window, query.skip);
            let page = match self.retry.run(&label, || self.pages.fetch_page(query)).await {
                Ok(page) => page,
                Err(_) => {
                    fetch.end = PageEnd::RetriesExhausted;
                    break;
                }
            };
            let items = match page {
                Value::Array(items) if !items.is_empty() => items,
                Value::Array(_) => {
                    warn!("{}: empty page, treating as end of data", label);
                    fetch.end = PageEnd::EmptyPage;
                    break;
                }
                other => {
                    warn!(
                        "{}: expected a list but got {}, treating as end of data",
                        label,
                        json_kind(&other)
                    );
                    fetch.end = PageEnd::NotAList;
                    break;
                }
            };

            let page_len = items.len();
            let before = fetch.records.len();
            for item in items {
                match item {
                    Value::Object(record) if self.source.keeps(&record) => {
                        fetch.records.push(record)
                    }
                    Value::Object(_) => {}
                    other => debug!("{}: skipping non-object item {}", label, other),
                }
            }
            fetch.pages += 1;
            fetch.seen += page_len;
            info!(
                "{}: {} records, {} kept",
                label,
                page_len,
                fetch.records.len() - before
            );

            if page_len < self.page_size {
                break;
            }
            query = query.next_page();
        }
        fetch
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
