//! Run configuration for the fetch pipeline.

use crate::error::HarvestError;
use crate::fetching::retry::RetryPolicy;
use crate::types::roc_date::{to_roc, to_western};
use bon::Builder;
use chrono::NaiveDate;
use std::time::Duration;

/// Calendar used for the date range sent to upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueryCalendar {
    /// `YYY.MM.DD`, year counted from 1912.
    #[default]
    Roc,
    /// `YYYY.MM.DD`.
    Western,
}

impl QueryCalendar {
    pub fn format(&self, date: NaiveDate) -> String {
        match self {
            QueryCalendar::Roc => to_roc(date),
            QueryCalendar::Western => to_western(date),
        }
    }
}

/// Tunables of one harvest run. Every field has a default.
///
/// # Examples
///
/// ```
/// use agrifetch::HarvestConfig;
///
/// let config = HarvestConfig::builder().max_workers(4).segment_days(7).build();
/// assert_eq!(config.max_workers, 4);
/// assert_eq!(config.page_size, 2000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct HarvestConfig {
    /// Number of windows fetched concurrently.
    #[builder(default = 10)]
    pub max_workers: usize,
    /// Maximum length of one date window in days.
    #[builder(default = 10)]
    pub segment_days: u32,
    /// Records requested per page (`$top`).
    #[builder(default = 2000)]
    pub page_size: usize,
    #[builder(default)]
    pub retry: RetryPolicy,
    /// Timeout of each individual HTTP call.
    #[builder(default = Duration::from_secs(40))]
    pub request_timeout: Duration,
    #[builder(default)]
    pub query_calendar: QueryCalendar,
    /// Skip TLS certificate verification. Upstream government hosts are known
    /// to serve chains that fail verification.
    #[builder(default = true)]
    pub accept_invalid_certs: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl HarvestConfig {
    /// # Errors
    ///
    /// Returns [`HarvestError::InvalidConfig`] if any count that must be positive is zero.
    pub fn validate(&self) -> Result<(), HarvestError> {
        let zero = [
            ("max_workers", self.max_workers == 0),
            ("page_size", self.page_size == 0),
            ("segment_days", self.segment_days == 0),
            ("retry.max_attempts", self.retry.max_attempts == 0),
        ];
        match zero.iter().find(|(_, is_zero)| *is_zero) {
            Some((name, _)) => Err(HarvestError::InvalidConfig(format!(
                "{name} must be at least 1"
            ))),
            None => Ok(()),
        }
    }
}
