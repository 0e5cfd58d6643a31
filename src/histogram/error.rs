use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistogramError {
    #[error("Bucket count must be at least 1, got {0}")]
    InvalidBucketCount(usize),

    #[error("No forecast values to build a histogram from")]
    EmptyInput,

    #[error("Histogram values must be finite, got {0}")]
    NonFiniteValue(f64),

    #[error("Failed to write histogram file '{0}'")]
    OutputWrite(PathBuf, #[source] std::io::Error),
}
