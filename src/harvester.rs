//! Entry point for downloading a date range of an upstream dataset into one CSV file.

use crate::config::HarvestConfig;
use crate::dispatch::{Dispatcher, HarvestReport};
use crate::error::HarvestError;
use crate::fetching::page_source::{HttpPageSource, PageSource};
use crate::fetching::paged_fetcher::PagedFetcher;
use crate::output::csv_sink::CsvSink;
use crate::types::data_source::DataSource;
use crate::types::date_window::plan_windows;
use crate::types::progress::FetchProgress;
use bon::bon;
use chrono::NaiveDate;
use log::info;
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;

/// HTTP client for the upstream open-data service.
///
/// Holds one connection pool shared by all windows of a run, so a single
/// `Harvester` can be reused for several datasets or ranges.
///
/// # Examples
///
/// ```rust,no_run
/// # use agrifetch::{Dataset, HarvestConfig, HarvestError, Harvester};
/// # use chrono::NaiveDate;
/// # use std::path::Path;
/// # #[tokio::main]
/// # async fn main() -> Result<(), HarvestError> {
/// let harvester = Harvester::new(HarvestConfig::builder().max_workers(4).build())?;
/// let report = harvester
///     .fetch()
///     .source(Dataset::FruitPrices)
///     .start(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
///     .end(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
///     .output(Path::new("fruit_prices.csv"))
///     .call()
///     .await?;
/// println!("{} records written", report.records_written);
/// # Ok(())
/// # }
/// ```
pub struct Harvester {
    client: Client,
    config: HarvestConfig,
}

#[bon]
impl Harvester {
    /// # Errors
    ///
    /// Returns [`HarvestError::InvalidConfig`] if `config` does not validate, and
    /// [`HarvestError::HttpClientBuild`] if the HTTP client cannot be set up.
    pub fn new(config: HarvestConfig) -> Result<Self, HarvestError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .gzip(true)
            .build()
            .map_err(HarvestError::HttpClientBuild)?;
        Ok(Self { client, config })
    }

    /// Downloads every record of `source` dated from `start` to `end` (inclusive)
    /// into a new CSV file at `output`.
    ///
    /// This method uses a builder pattern.
    ///
    /// Windows that fail are logged and counted in the report rather than
    /// returned as errors.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Window`] if the range is empty and
    /// [`HarvestError::Output`] if the output file cannot be created.
    #[builder]
    pub async fn fetch(
        &self,
        #[builder(into)] source: DataSource,
        start: NaiveDate,
        end: NaiveDate,
        output: &Path,
    ) -> Result<HarvestReport, HarvestError> {
        let pages = HttpPageSource::new(self.client.clone(), &source, self.config.query_calendar);
        harvest(pages, source, &self.config, start, end, output).await
    }
}

/// Runs the whole pipeline against any [`PageSource`]: plans the windows,
/// writes the header and dispatches the windows.
pub async fn harvest<S: PageSource + 'static>(
    pages: S,
    source: DataSource,
    config: &HarvestConfig,
    start: NaiveDate,
    end: NaiveDate,
    output: &Path,
) -> Result<HarvestReport, HarvestError> {
    config.validate()?;
    let windows: Vec<_> = plan_windows(start, end, config.segment_days)?.collect();
    info!(
        "Harvesting {} from {} to {} in {} windows of up to {} days",
        source.name,
        start,
        end,
        windows.len(),
        config.segment_days
    );

    let sink = CsvSink::create(output, &source.header()).await?;
    let fetcher = PagedFetcher::new(
        Arc::new(pages),
        Arc::new(source),
        config.page_size,
        config.retry,
    );
    let progress = Arc::new(FetchProgress::new(windows.len()));
    let report = Dispatcher::new(fetcher, sink, config.max_workers)
        .run(windows, progress)
        .await;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetching::page_source::PageQuery;
    use crate::fetching::retry::RetryPolicy;
    use crate::fetching::stub::{fruit_page, StubPages};
    use crate::output::csv_sink::UTF8_BOM;
    use crate::types::data_source::Dataset;
    use crate::types::error::InvalidRangeError;
    use std::time::Duration;
    use tempfile::tempdir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn config() -> HarvestConfig {
        HarvestConfig::builder()
            .max_workers(3)
            .segment_days(10)
            .page_size(2)
            .retry(RetryPolicy::new(2, Duration::from_millis(1)))
            .build()
    }

    #[tokio::test]
    async fn test_short_range_is_one_window() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let output = dir.path().join("fruit.csv");
        let stub = StubPages::new(|_query: &PageQuery, _attempt| Ok(fruit_page(0, 1)));

        let report = harvest(
            stub,
            Dataset::FruitPrices.source(),
            &config(),
            date(2024, 1, 1),
            date(2024, 1, 3),
            &output,
        )
        .await?;

        assert_eq!(report.windows, 1);
        assert_eq!(report.records_written, 1);
        let bytes = std::fs::read(&output)?;
        let text = std::str::from_utf8(&bytes[UTF8_BOM.len()..])?;
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "交易日期,種類代碼,作物代號,作物名稱,市場代號,市場名稱,上價,中價,下價,平均價,交易量",
                "2024.05.02,N05,A1,香蕉-其他,109,台北一,,,,32.4,1520",
            ]
        );
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_pages_every_window_to_the_end() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let output = dir.path().join("fruit.csv");
        // Five records per window, served two per page.
        let stub = StubPages::new(|query: &PageQuery, _attempt| {
            let len = 5usize.saturating_sub(query.skip).min(query.top);
            Ok(fruit_page(query.skip, len))
        });

        let report = harvest(
            stub,
            Dataset::SelectedFruits.source(),
            &config(),
            date(2024, 1, 1),
            date(2024, 1, 31),
            &output,
        )
        .await?;

        assert_eq!(report.windows, 4);
        assert_eq!(report.windows_with_data, 4);
        assert_eq!(report.records_written, 20);
        assert_eq!(report.progress.completed, 4);
        assert_eq!(report.progress.total, 4);

        let mut reader = csv::Reader::from_path(&output)?;
        for row in reader.records() {
            assert_eq!(&row?[4], "香蕉");
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_reversed_range_creates_no_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let output = dir.path().join("never.csv");
        let stub = StubPages::new(|_query: &PageQuery, _attempt| Ok(fruit_page(0, 1)));

        let result = harvest(
            stub,
            Dataset::ProducePrices.source(),
            &config(),
            date(2024, 2, 1),
            date(2024, 1, 1),
            &output,
        )
        .await;

        assert!(matches!(
            result,
            Err(HarvestError::Window(InvalidRangeError::StartAfterEnd { .. }))
        ));
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = HarvestConfig::builder().max_workers(0).build();
        assert!(matches!(
            Harvester::new(config),
            Err(HarvestError::InvalidConfig(_))
        ));
        assert!(Harvester::new(HarvestConfig::default()).is_ok());
    }
}
