use crate::addresses::error::ParseError;
use crate::config::error::ConfigError;
use crate::histogram::error::HistogramError;
use crate::location::error::LocateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherHistogramError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error(transparent)]
    Histogram(#[from] HistogramError),

    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
}
