//! Client for the OpenWeatherMap 5 day / 3 hour forecast endpoint.
//!
//! The provider reports application failures in the payload (`cod` and
//! `message`), sometimes with a 200 status and sometimes with a matching HTTP
//! status. Both shapes are classified here so the pipeline only sees
//! [`FetchError`] variants.

use crate::forecast::client::{Forecast, ForecastClient, ForecastDay};
use crate::forecast::error::FetchError;
use crate::location::resolver::{LatLon, Located};
use bon::bon;
use chrono::{DateTime, FixedOffset, NaiveDate};
use log::debug;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

/// Temperature units understood by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Fahrenheit
    #[default]
    Imperial,
    /// Celsius
    Metric,
    /// Kelvin
    Standard,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Imperial => "imperial",
            Units::Metric => "metric",
            Units::Standard => "standard",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "imperial" => Ok(Units::Imperial),
            "metric" => Ok(Units::Metric),
            "standard" => Ok(Units::Standard),
            other => Err(format!(
                "unknown units '{other}', expected one of: imperial, metric, standard"
            )),
        }
    }
}

pub struct OpenWeatherClient {
    http: Client,
    base_url: String,
    api_key: String,
    units: Units,
}

#[bon]
impl OpenWeatherClient {
    /// Creates a client. `timeout` bounds both connecting and the whole request.
    #[builder]
    pub fn new(
        #[builder(into)] base_url: String,
        #[builder(into)] api_key: String,
        #[builder(default)] units: Units,
        #[builder(default = Duration::from_secs(5))] timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url,
            api_key,
            units,
        })
    }
}

impl ForecastClient for OpenWeatherClient {
    async fn fetch_forecast(&self, target: &Located) -> Result<Forecast, FetchError> {
        let LatLon(lat, lon) = target.location;
        debug!(
            "Requesting forecast for {} at ({}, {})",
            target.address, lat, lon
        );

        // Errors are stripped of their URL: the query string carries the API key.
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("appid", self.api_key.as_str()), ("units", self.units.as_str())])
            .query(&[("lat", lat), ("lon", lon)])
            .send()
            .await
            .map_err(|e| FetchError::Transport(self.base_url.clone(), e.without_url()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(self.base_url.clone(), e.without_url()))?;

        let payload: Value = match serde_json::from_slice(&body) {
            Ok(payload) => payload,
            Err(e) if status.is_success() => {
                return Err(FetchError::Decode(self.base_url.clone(), e));
            }
            Err(_) => Value::Null,
        };

        if let Some(soft_error) = classify_soft_error(status, &payload) {
            return Err(soft_error);
        }
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: self.base_url.clone(),
                status,
            });
        }

        let parsed: ForecastResponse = serde_json::from_value(payload)
            .map_err(|e| FetchError::Decode(self.base_url.clone(), e))?;
        Ok(parsed.into_forecast())
    }
}

/// Maps the provider's `cod`/`message` pair onto the error taxonomy.
///
/// A 401 or 429 status is a quota error whatever the body holds. Returns
/// `None` for successful payloads, and for failures on other non-2xx
/// responses that carry nothing recognisable (those are plain HTTP errors).
pub(crate) fn classify_soft_error(status: StatusCode, payload: &Value) -> Option<FetchError> {
    let code = match payload.get("cod") {
        Some(Value::String(code)) => code.clone(),
        Some(Value::Number(code)) => code.to_string(),
        // A refused key or rate limit stops the run whatever the body says
        _ if is_quota_status(status) => {
            return Some(FetchError::QuotaExceeded(format!("HTTP status {status}")));
        }
        _ => return None,
    };
    if code == "200" && !is_quota_status(status) {
        return None;
    }

    let message = payload
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let lowered = message.to_ascii_lowercase();
    let described = if message.is_empty() {
        format!("code {code}")
    } else {
        message.clone()
    };

    if is_quota_status(status)
        || matches!(code.as_str(), "401" | "429")
        || lowered.contains("limit")
        || lowered.contains("blocked")
        || lowered.contains("api key")
    {
        Some(FetchError::QuotaExceeded(described))
    } else if code == "404" || lowered.contains("not found") {
        Some(FetchError::LocationNotFound(described))
    } else if status.is_success() {
        Some(FetchError::UnknownSoftError { code, message })
    } else {
        None
    }
}

fn is_quota_status(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::TOO_MANY_REQUESTS
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    city: Option<City>,
    list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct City {
    /// Offset from UTC in seconds.
    #[serde(default)]
    timezone: i64,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    dt: i64,
    main: MainReading,
}

#[derive(Debug, Deserialize)]
struct MainReading {
    temp_max: f64,
}

impl ForecastResponse {
    /// Folds the 3-hourly entries into one high per local calendar day.
    fn into_forecast(self) -> Forecast {
        let utc_offset = self
            .city
            .and_then(|city| i32::try_from(city.timezone).ok())
            .and_then(FixedOffset::east_opt);
        let mut highs: BTreeMap<NaiveDate, f64> = BTreeMap::new();

        for entry in self.list {
            let Some(at) = DateTime::from_timestamp(entry.dt, 0) else {
                continue;
            };
            let date = match utc_offset {
                Some(offset) => at.with_timezone(&offset).date_naive(),
                None => at.date_naive(),
            };
            highs
                .entry(date)
                .and_modify(|high| *high = high.max(entry.main.temp_max))
                .or_insert(entry.main.temp_max);
        }

        Forecast {
            utc_offset,
            days: highs
                .into_iter()
                .map(|(date, high)| ForecastDay { date, high })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn units_parse_case_insensitively() {
        assert_eq!("Metric".parse::<Units>(), Ok(Units::Metric));
        assert_eq!(" imperial ".parse::<Units>(), Ok(Units::Imperial));
        assert!("kelvin".parse::<Units>().is_err());
    }

    #[test]
    fn success_payload_is_not_an_error() {
        let payload = json!({"cod": "200", "message": 0, "list": []});
        assert!(classify_soft_error(StatusCode::OK, &payload).is_none());
    }

    #[test]
    fn quota_and_key_errors_are_fatal() {
        let cases = [
            (StatusCode::UNAUTHORIZED, json!({"cod": 401, "message": "Invalid API key. Please see https://openweathermap.org/faq#error401 for more info."})),
            (StatusCode::TOO_MANY_REQUESTS, json!({"cod": 429, "message": "Your account is temporary blocked due to exceeding of requests limitation"})),
            (StatusCode::OK, json!({"cod": "500", "message": "requests limit exceeded"})),
        ];
        for (status, payload) in cases {
            let error = classify_soft_error(status, &payload);
            assert!(
                matches!(error, Some(FetchError::QuotaExceeded(_))),
                "{payload} should be a quota error, got {error:?}"
            );
            assert!(error.is_some_and(|e| e.is_fatal()));
        }
    }

    #[test]
    fn quota_status_without_payload_is_fatal() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::TOO_MANY_REQUESTS] {
            for payload in [Value::Null, json!({}), json!({"cod": "200"})] {
                let error = classify_soft_error(status, &payload);
                assert!(
                    matches!(error, Some(FetchError::QuotaExceeded(_))),
                    "{status} with {payload} should be a quota error, got {error:?}"
                );
            }
        }
        assert!(classify_soft_error(StatusCode::SERVICE_UNAVAILABLE, &Value::Null).is_none());
    }

    #[test]
    fn not_found_is_recoverable() {
        let payload = json!({"cod": "404", "message": "city not found"});
        let error = classify_soft_error(StatusCode::NOT_FOUND, &payload);
        assert!(matches!(error, Some(FetchError::LocationNotFound(ref m)) if m == "city not found"));
        assert!(!error.is_some_and(|e| e.is_fatal()));
    }

    #[test]
    fn unknown_codes_on_success_are_soft_errors() {
        let payload = json!({"cod": "418", "message": "teapot"});
        assert!(matches!(
            classify_soft_error(StatusCode::OK, &payload),
            Some(FetchError::UnknownSoftError { ref code, .. }) if code == "418"
        ));
        assert!(classify_soft_error(StatusCode::BAD_GATEWAY, &payload).is_none());
    }

    #[test]
    fn entries_fold_into_local_daily_highs() {
        // 2018-04-13 22:00 UTC and 2018-04-14 01:00 UTC, both 2018-04-14 at UTC+3
        let response: ForecastResponse = serde_json::from_value(json!({
            "cod": "200",
            "city": {"name": "Somewhere", "timezone": 10800},
            "list": [
                {"dt": 1523656800, "main": {"temp": 50.0, "temp_max": 51.5}},
                {"dt": 1523667600, "main": {"temp": 54.0, "temp_max": 55.25}},
                {"dt": 1523588400, "main": {"temp": 40.0, "temp_max": 44.0}}
            ]
        }))
        .unwrap();

        let forecast = response.into_forecast();
        let april = |d| NaiveDate::from_ymd_opt(2018, 4, d).unwrap();

        assert_eq!(forecast.utc_offset, FixedOffset::east_opt(10800));
        assert_eq!(forecast.days.len(), 2);
        assert_eq!(forecast.high_on(april(14)), Some(55.25));
        assert_eq!(forecast.high_on(april(13)), Some(44.0));
    }
}
