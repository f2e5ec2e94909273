use std::path::PathBuf;

/// Failure to obtain the dataset text. Malformed rows are not errors; they are
/// reported per row by the parser.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read dataset '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch dataset from {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("dataset load was cancelled")]
    Cancelled,
}

impl LoadError {
    /// Cancellation is the host's own doing; everything else may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, LoadError::Cancelled)
    }
}
