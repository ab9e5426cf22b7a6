use thiserror::Error;

/// Network-level failure. Transient variants are retried by the fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported encoding label: {0}")]
    Encoding(String),

    #[error("Browser error: {0}")]
    Browser(String),
}

impl FetchError {
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout { url: url.to_string() }
        } else {
            FetchError::Network {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Worth another attempt: connection trouble, timeouts, throttling, 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network { .. } | FetchError::Timeout { .. } => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// The page did not have the structure the extractor needs. The record is dropped.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Empty document: {0}")]
    EmptyDocument(String),

    #[error("Missing {element} on {url}")]
    MissingElement { url: String, element: &'static str },
}
