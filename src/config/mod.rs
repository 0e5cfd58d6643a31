//! Runtime settings: defaults, then a TOML file, then environment variables.
//!
//! Nothing secret has a default. The API key must come from the config file,
//! the environment or a `.env` file.

pub mod error;

use crate::addresses::log_parser::DEFAULT_FIELD_INDEX;
use crate::config::error::ConfigError;
use crate::forecast::openweather::{Units, DEFAULT_BASE_URL};
use crate::forecast::pipeline::{DEFAULT_CALL_CEILING, DEFAULT_THROTTLE};
use log::{debug, info};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const ENV_PREFIX: &str = "WEATHER_HISTOGRAM_";
const CONFIG_ENV: &str = "WEATHER_HISTOGRAM_CONFIG";
const LOCAL_CONFIG_FILE: &str = "weather-histogram.toml";
const CONFIG_DIR_NAME: &str = "weather-histogram";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Zero-based column of the client address in each log line.
    pub field_index: usize,
    pub base_url: String,
    pub api_key: String,
    pub units: Units,
    /// Pause after every provider call.
    pub throttle_seconds: f64,
    /// Connect and request timeout for provider calls.
    pub timeout_seconds: f64,
    /// Maximum provider calls in one run.
    pub call_ceiling: u32,
    /// GeoLite2 City database.
    pub geoip_db: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            field_index: DEFAULT_FIELD_INDEX,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            units: Units::default(),
            throttle_seconds: DEFAULT_THROTTLE.as_secs_f64(),
            timeout_seconds: DEFAULT_TIMEOUT.as_secs_f64(),
            call_ceiling: DEFAULT_CALL_CEILING,
            geoip_db: PathBuf::from("files/GeoLite2-City.mmdb"),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("field_index", &self.field_index)
            .field("base_url", &self.base_url)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("units", &self.units)
            .field("throttle_seconds", &self.throttle_seconds)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("call_ceiling", &self.call_ceiling)
            .field("geoip_db", &self.geoip_db)
            .finish()
    }
}

impl Settings {
    /// Loads settings from every source and validates the result.
    ///
    /// The config file is `explicit` when given, otherwise the first that
    /// exists of `$WEATHER_HISTOGRAM_CONFIG`, `./weather-histogram.toml` and
    /// `<config dir>/weather-histogram/config.toml`. Environment variables
    /// named `WEATHER_HISTOGRAM_<FIELD>` override the file.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`]; a missing API key is reported by validation.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file loaded: {}", e);
        }

        let mut settings = match find_config_file(explicit)? {
            Some(path) => {
                info!("Loading config from {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        settings.apply_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    /// Applies `WEATHER_HISTOGRAM_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(raw) = var("FIELD_INDEX") {
            self.field_index = parse_value("FIELD_INDEX", &raw)?;
        }
        if let Some(raw) = var("BASE_URL") {
            self.base_url = raw.trim().to_string();
        }
        if let Some(raw) = var("API_KEY") {
            self.api_key = raw.trim().to_string();
        }
        if let Some(raw) = var("UNITS") {
            self.units = raw.parse().map_err(|message| ConfigError::InvalidValue {
                key: format!("{ENV_PREFIX}UNITS"),
                message,
            })?;
        }
        if let Some(raw) = var("THROTTLE_SECONDS") {
            self.throttle_seconds = parse_value("THROTTLE_SECONDS", &raw)?;
        }
        if let Some(raw) = var("TIMEOUT_SECONDS") {
            self.timeout_seconds = parse_value("TIMEOUT_SECONDS", &raw)?;
        }
        if let Some(raw) = var("CALL_CEILING") {
            self.call_ceiling = parse_value("CALL_CEILING", &raw)?;
        }
        if let Some(raw) = var("GEOIP_DB") {
            self.geoip_db = PathBuf::from(raw.trim());
        }
        Ok(())
    }

    /// Checks every setting and reports all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut issues: Vec<String> = Vec::new();

        if self.api_key.trim().is_empty() {
            issues.push(format!(
                "api_key is required (set {ENV_PREFIX}API_KEY or api_key in the config file)"
            ));
        }
        if let Err(e) = reqwest::Url::parse(&self.base_url) {
            issues.push(format!("base_url '{}' is not a valid URL: {}", self.base_url, e));
        }
        if Duration::try_from_secs_f64(self.throttle_seconds).is_err() {
            issues.push(format!(
                "throttle_seconds must be a duration >= 0, got {}",
                self.throttle_seconds
            ));
        }
        match Duration::try_from_secs_f64(self.timeout_seconds) {
            Ok(timeout) if !timeout.is_zero() => {}
            _ => issues.push(format!(
                "timeout_seconds must be a duration > 0, got {}",
                self.timeout_seconds
            )),
        }
        if self.call_ceiling == 0 {
            issues.push("call_ceiling must be > 0".into());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(issues))
        }
    }

    /// Only meaningful once [`validate`](Self::validate) has passed; out of
    /// range values fall back to zero.
    pub fn throttle(&self) -> Duration {
        Duration::try_from_secs_f64(self.throttle_seconds).unwrap_or_default()
    }

    /// Only meaningful once [`validate`](Self::validate) has passed; out of
    /// range values fall back to the default timeout.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_seconds)
            .ok()
            .filter(|timeout| !timeout.is_zero())
            .unwrap_or(DEFAULT_TIMEOUT)
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key: format!("{ENV_PREFIX}{name}"),
            message: e.to_string(),
        })
}

fn find_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    let required = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    if let Some(path) = required {
        return if path.exists() {
            Ok(Some(path))
        } else {
            Err(ConfigError::NotFound(path))
        };
    }

    let mut candidates = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join(CONFIG_DIR_NAME).join("config.toml"));
    }
    Ok(candidates.into_iter().find(|path| path.exists()))
}
