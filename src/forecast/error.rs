use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    // Timeouts, refused connections, resets
    #[error("Network request failed for {0}")]
    Transport(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to decode forecast response from {0}")]
    Decode(String, #[source] serde_json::Error),

    /// Quota, rate limit or API key problems. Nothing further will succeed
    /// during this run.
    #[error("Provider refused the request: {0}")]
    QuotaExceeded(String),

    #[error("Provider has no forecast for this location: {0}")]
    LocationNotFound(String),

    #[error("Provider returned an unrecognised error (code {code}): {message}")]
    UnknownSoftError { code: String, message: String },
}

impl FetchError {
    /// Whether this error ends the whole fetch loop rather than one item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FetchError::QuotaExceeded(_))
    }
}
