//! Command line front end: download a date range of prices into CSV, or summarize a downloaded file.

use agrifetch::{summarize_daily, Dataset, HarvestConfig, HarvestError, Harvester, QueryCalendar};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Taiwanese agricultural wholesale prices, fetched in concurrent date windows.
#[derive(Parser, Debug)]
#[command(name = "agrifetch")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download every record between two dates into one CSV file
    Fetch {
        /// fruit, produce or selected-fruits
        #[arg(long, env = "AGRIFETCH_DATASET")]
        dataset: Dataset,

        /// First day, YYYY-MM-DD
        #[arg(long, env = "AGRIFETCH_START")]
        start: NaiveDate,

        /// Last day (inclusive), YYYY-MM-DD
        #[arg(long, env = "AGRIFETCH_END")]
        end: NaiveDate,

        #[arg(long, env = "AGRIFETCH_OUTPUT")]
        output: PathBuf,

        /// Windows fetched concurrently
        #[arg(long, env = "AGRIFETCH_WORKERS")]
        workers: Option<usize>,

        /// Maximum days per window
        #[arg(long, env = "AGRIFETCH_SEGMENT_DAYS")]
        segment_days: Option<u32>,

        /// Records per page
        #[arg(long, env = "AGRIFETCH_PAGE_SIZE")]
        page_size: Option<usize>,

        /// Send the date range as YYYY.MM.DD instead of ROC dates
        #[arg(long, env = "AGRIFETCH_WESTERN_DATES")]
        western_dates: bool,

        /// Verify upstream TLS certificates
        #[arg(long, env = "AGRIFETCH_VERIFY_CERTS")]
        verify_certs: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,

        /// Also write a daily summary of the output to this path
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Write a daily per-crop summary of a downloaded CSV file
    Summarize {
        #[arg(long, env = "AGRIFETCH_DATASET")]
        dataset: Dataset,

        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), HarvestError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Command::Fetch {
            dataset,
            start,
            end,
            output,
            workers,
            segment_days,
            page_size,
            western_dates,
            verify_certs,
            json,
            summary,
        } => {
            let calendar = if western_dates {
                QueryCalendar::Western
            } else {
                QueryCalendar::Roc
            };
            let config = HarvestConfig::builder()
                .maybe_max_workers(workers)
                .maybe_segment_days(segment_days)
                .maybe_page_size(page_size)
                .query_calendar(calendar)
                .accept_invalid_certs(!verify_certs)
                .build();

            let harvester = Harvester::new(config)?;
            let report = harvester
                .fetch()
                .source(dataset)
                .start(start)
                .end(end)
                .output(&output)
                .call()
                .await?;

            println!(
                "Done: {} records from {} windows ({} with data, {} failed) written to {}",
                report.records_written,
                report.windows,
                report.windows_with_data,
                report.windows_failed,
                output.display()
            );
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            if let Some(summary) = summary {
                let rows = summarize_daily(&output, &summary, &dataset.source().summary).await?;
                println!("Summary: {} rows written to {}", rows, summary.display());
            }
        }
        Command::Summarize {
            dataset,
            input,
            output,
        } => {
            let rows = summarize_daily(&input, &output, &dataset.source().summary).await?;
            println!("Summary: {} rows written to {}", rows, output.display());
        }
    }
    Ok(())
}
