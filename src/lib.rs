mod config;
mod dispatch;
mod error;
mod fetching;
mod harvester;
mod normalize;
mod output;
mod summary;
mod types;

pub use config::{HarvestConfig, QueryCalendar};
pub use dispatch::{Dispatcher, HarvestReport};
pub use error::HarvestError;
pub use harvester::{harvest, Harvester};
pub use normalize::normalize_record;
pub use summary::{summarize_daily, SummaryError};

pub use fetching::error::FetchError;
pub use fetching::page_source::{HttpPageSource, PageQuery, PageSource};
pub use fetching::paged_fetcher::{PageEnd, PagedFetcher, WindowFetch};
pub use fetching::retry::RetryPolicy;

pub use output::csv_sink::{CsvSink, UTF8_BOM};
pub use output::error::OutputError;

pub use types::data_source::*;
pub use types::date_window::{plan_windows, DateWindow, Windows};
pub use types::error::InvalidRangeError;
pub use types::progress::{FetchProgress, ProgressSnapshot};
pub use types::record::{NormalizedRecord, RawRecord};
pub use types::roc_date::{parse_roc, roc_to_western, to_roc, to_western, ROC_EPOCH_OFFSET};
