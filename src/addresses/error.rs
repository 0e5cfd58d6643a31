use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read log file '{0}'")]
    LogRead(PathBuf, #[source] std::io::Error),
}
