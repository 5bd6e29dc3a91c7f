//! In-memory [`PageSource`] for tests.

use crate::fetching::error::FetchError;
use crate::fetching::page_source::{PageQuery, PageSource};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::future::{ready, Future};
use std::sync::Mutex;
use tokio::time::Instant;

/// Answers each query with `respond(query, attempt)`, where `attempt` counts
/// calls for that exact query starting at 1. Every call is recorded.
pub(crate) struct StubPages<F> {
    respond: F,
    attempts: Mutex<HashMap<PageQuery, u32>>,
    calls: Mutex<Vec<(PageQuery, Instant)>>,
}

impl<F> StubPages<F>
where
    F: Fn(&PageQuery, u32) -> Result<Value, FetchError> + Send + Sync,
{
    pub(crate) fn new(respond: F) -> Self {
        Self {
            respond,
            attempts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(PageQuery, Instant)> {
        self.calls.lock().unwrap().clone()
    }
}

impl<F> PageSource for StubPages<F>
where
    F: Fn(&PageQuery, u32) -> Result<Value, FetchError> + Send + Sync,
{
    fn fetch_page(&self, query: PageQuery) -> impl Future<Output = Result<Value, FetchError>> + Send {
        self.calls.lock().unwrap().push((query, Instant::now()));
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let attempt = attempts.entry(query).or_insert(0);
            *attempt += 1;
            *attempt
        };
        ready((self.respond)(&query, attempt))
    }
}

pub(crate) fn transient_error() -> FetchError {
    let source = serde_json::from_str::<Value>("[{\"truncated\"").unwrap_err();
    FetchError::MalformedBody {
        url: "stub://pages".to_string(),
        source,
    }
}

/// `len` fruit records numbered from `first` in the `Seq` field.
pub(crate) fn fruit_page(first: usize, len: usize) -> Value {
    (first..first + len)
        .map(|seq| {
            json!({
                "Seq": seq,
                "TransDate": "113.05.02",
                "CategoryCode": "N05",
                "CropCode": "A1",
                "CropName": "香蕉-其他",
                "MarketCode": "109",
                "MarketName": "台北一",
                "AveragePrice": 32.4,
                "TransVolume": 1520,
            })
        })
        .collect()
}
