use crate::fetching::error::FetchError;
use crate::output::error::OutputError;
use crate::summary::SummaryError;
use crate::types::error::InvalidRangeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error(transparent)]
    Window(#[from] InvalidRangeError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error(transparent)]
    Summary(#[from] SummaryError),

    #[error("Failed to build HTTP client")]
    HttpClientBuild(#[source] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to encode report")]
    ReportEncode(#[from] serde_json::Error),
}
