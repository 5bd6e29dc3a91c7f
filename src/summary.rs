//! Daily price summary over a CSV written by the dispatcher.

use crate::output::csv_sink::UTF8_BOM;
use crate::types::data_source::SummaryColumns;
use log::info;
use polars::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::task;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Failed to read price file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to summarize prices")]
    Polars(#[from] PolarsError),

    #[error("Failed to write summary file '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] task::JoinError),
}

/// Groups the rows of `input` by day and crop, and writes one row per group to `output`.
///
/// Output columns are the date, crop code and crop name columns of `columns`,
/// then `AveragePrice` (mean), `TransVolume` (sum) and `Markets` (rows in the
/// group), sorted by date and crop code. Prices or volumes that are empty or
/// not numeric are ignored. The file is written with a UTF-8 BOM.
///
/// Returns the number of summary rows.
pub async fn summarize_daily(
    input: &Path,
    output: &Path,
    columns: &SummaryColumns,
) -> Result<usize, SummaryError> {
    let bytes = tokio::fs::read(input)
        .await
        .map_err(|e| SummaryError::Read(input.to_path_buf(), e))?;
    let output = output.to_path_buf();
    let columns = *columns;

    let rows = task::spawn_blocking(move || {
        let mut df = daily_frame(bytes, &columns)?.collect()?;
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SummaryError::Write(output.clone(), e))?;
        }
        let mut file =
            std::fs::File::create(&output).map_err(|e| SummaryError::Write(output.clone(), e))?;
        CsvWriter::new(&mut file)
            .include_bom(true)
            .include_header(true)
            .finish(&mut df)?;
        Ok::<usize, SummaryError>(df.height())
    })
    .await??;

    info!("Summarized {} into {} daily rows", input.display(), rows);
    Ok(rows)
}

fn daily_frame(mut bytes: Vec<u8>, columns: &SummaryColumns) -> Result<LazyFrame, SummaryError> {
    if bytes.starts_with(UTF8_BOM) {
        bytes.drain(..UTF8_BOM.len());
    }
    // Every column as text; numbers are cast explicitly below.
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;

    Ok(df
        .lazy()
        .with_columns([
            col(columns.average_price).cast(DataType::Float64),
            col(columns.volume).cast(DataType::Float64),
        ])
        .group_by([col(columns.date), col(columns.crop_code)])
        .agg([
            col(columns.crop_name).first(),
            col(columns.average_price).mean().alias("AveragePrice"),
            col(columns.volume).sum().alias("TransVolume"),
            len().alias("Markets"),
        ])
        .sort(
            [columns.date, columns.crop_code],
            SortMultipleOptions::default(),
        ))
}
