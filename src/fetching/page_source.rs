use crate::config::QueryCalendar;
use crate::fetching::error::FetchError;
use crate::types::data_source::DataSource;
use crate::types::date_window::DateWindow;
use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;
use std::future::Future;

/// One page request: a date window plus `$top`/`$skip` paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageQuery {
    pub window: DateWindow,
    pub top: usize,
    pub skip: usize,
}

impl PageQuery {
    pub fn first(window: DateWindow, top: usize) -> Self {
        Self { window, top, skip: 0 }
    }

    pub fn next_page(self) -> Self {
        Self {
            skip: self.skip + self.top,
            ..self
        }
    }
}

/// Something that can answer page requests with a decoded JSON body.
///
/// The pipeline only ever talks to upstream through this trait, so it can run
/// against a stub as well as against the real HTTP endpoint.
pub trait PageSource: Send + Sync {
    fn fetch_page(&self, query: PageQuery)
        -> impl Future<Output = Result<Value, FetchError>> + Send;
}

/// [`PageSource`] backed by an upstream list endpoint over HTTP.
pub struct HttpPageSource {
    client: Client,
    endpoint: String,
    extra_params: Vec<(String, String)>,
    calendar: QueryCalendar,
}

impl HttpPageSource {
    pub fn new(client: Client, source: &DataSource, calendar: QueryCalendar) -> Self {
        Self {
            client,
            endpoint: source.endpoint.clone(),
            extra_params: source.extra_params.clone(),
            calendar,
        }
    }

    pub fn query_params(&self, query: &PageQuery) -> Vec<(String, String)> {
        let mut params = vec![
            ("StartDate".to_string(), self.calendar.format(query.window.start)),
            ("EndDate".to_string(), self.calendar.format(query.window.end)),
            ("$top".to_string(), query.top.to_string()),
            ("$skip".to_string(), query.skip.to_string()),
        ];
        params.extend(self.extra_params.iter().cloned());
        params
    }

    async fn get(&self, query: PageQuery) -> Result<Value, FetchError> {
        let params = self.query_params(&query);
        debug!("GET {} {:?}", self.endpoint, params);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(self.endpoint.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", self.endpoint, e);
                return Err(if let Some(status) = e.status() {
                    FetchError::HttpStatus {
                        url: self.endpoint.clone(),
                        status,
                        source: e,
                    }
                } else {
                    FetchError::NetworkRequest(self.endpoint.clone(), e)
                });
            }
        };

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::BodyRead(self.endpoint.clone(), e))?;
        serde_json::from_slice(strip_bom(&body)).map_err(|e| FetchError::MalformedBody {
            url: self.endpoint.clone(),
            source: e,
        })
    }
}

impl PageSource for HttpPageSource {
    fn fetch_page(
        &self,
        query: PageQuery,
    ) -> impl Future<Output = Result<Value, FetchError>> + Send {
        self.get(query)
    }
}

fn strip_bom(body: &[u8]) -> &[u8] {
    body.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(body)
}
