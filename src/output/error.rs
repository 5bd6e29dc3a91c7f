use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to create output file '{0}'")]
    Create(PathBuf, #[source] std::io::Error),

    #[error("Failed to append to output file '{0}'")]
    Append(PathBuf, #[source] std::io::Error),

    #[error("Row has {found} fields but '{path}' has {expected} columns")]
    RowWidth {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("Failed to encode CSV rows")]
    Encode(#[from] csv::Error),
}
