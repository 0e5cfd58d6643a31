use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file '{0}' does not exist")]
    NotFound(PathBuf),

    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Invalid config:\n - {}", .0.join("\n - "))]
    Invalid(Vec<String>),
}
