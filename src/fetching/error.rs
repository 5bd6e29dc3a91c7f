use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read response body from {0}")]
    BodyRead(String, #[source] reqwest::Error),

    #[error("Response body from {url} is not valid JSON")]
    MalformedBody {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Giving up after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}
