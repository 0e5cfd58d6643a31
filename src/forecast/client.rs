//! The forecast capability consumed by the acquisition pipeline.

use crate::forecast::error::FetchError;
use crate::location::resolver::Located;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Forecast high for one calendar day at the requested location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub high: f64,
}

/// A multi-day forecast. Days are not guaranteed to be in any order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    /// Days are calendar days at this offset. `None` means UTC.
    pub utc_offset: Option<FixedOffset>,
    pub days: Vec<ForecastDay>,
}

impl Forecast {
    /// The day after `now`, as a calendar date at the forecast's location.
    pub fn tomorrow(&self, now: DateTime<Utc>) -> Option<NaiveDate> {
        let today = match self.utc_offset {
            Some(offset) => now.with_timezone(&offset).date_naive(),
            None => now.date_naive(),
        };
        today.succ_opt()
    }

    /// The high for the location's next calendar day, seen from `now`.
    pub fn high_tomorrow(&self, now: DateTime<Utc>) -> Option<f64> {
        self.tomorrow(now).and_then(|date| self.high_on(date))
    }

    /// Scans the forecast for the given calendar day.
    pub fn high_on(&self, date: NaiveDate) -> Option<f64> {
        self.days
            .iter()
            .find(|day| day.date == date)
            .map(|day| day.high)
    }
}

/// Fetches a forecast for one located address.
///
/// Implementations own their timeouts; the pipeline only sequences calls.
#[allow(async_fn_in_trait)]
pub trait ForecastClient {
    async fn fetch_forecast(&self, target: &Located) -> Result<Forecast, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_on_matches_by_date_not_position() {
        let day = |d: u32, high: f64| ForecastDay {
            date: NaiveDate::from_ymd_opt(2018, 4, d).unwrap(),
            high,
        };
        let forecast = Forecast {
            utc_offset: None,
            days: vec![day(14, 61.2), day(12, 55.0), day(13, 58.4)],
        };

        assert_eq!(forecast.high_on(NaiveDate::from_ymd_opt(2018, 4, 13).unwrap()), Some(58.4));
        assert_eq!(forecast.high_on(NaiveDate::from_ymd_opt(2018, 4, 15).unwrap()), None);
    }

    #[test]
    fn tomorrow_follows_the_location_calendar() {
        let day = |d: u32, high: f64| ForecastDay {
            date: NaiveDate::from_ymd_opt(2018, 4, d).unwrap(),
            high,
        };
        // 2018-04-12 12:00 UTC is already 02:00 on the 13th at UTC+14
        let now = DateTime::from_timestamp(1523534400, 0).unwrap();
        let mut forecast = Forecast {
            utc_offset: FixedOffset::east_opt(14 * 3600),
            days: vec![day(13, 18.0), day(14, 27.5)],
        };

        assert_eq!(forecast.tomorrow(now), NaiveDate::from_ymd_opt(2018, 4, 14));
        assert_eq!(forecast.high_tomorrow(now), Some(27.5));

        forecast.utc_offset = None;
        assert_eq!(forecast.high_tomorrow(now), Some(18.0));

        forecast.utc_offset = FixedOffset::west_opt(10 * 3600);
        assert_eq!(forecast.high_tomorrow(now), Some(18.0));
    }
}
