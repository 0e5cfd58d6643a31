mod addresses;
mod config;
mod error;
mod forecast;
mod histogram;
mod location;
mod report;
mod weather_histogram;

pub use error::WeatherHistogramError;
pub use weather_histogram::*;

pub use addresses::error::ParseError;
pub use addresses::log_parser::{
    parse_lines, parse_log_file, ParsedLog, Rejection, DEFAULT_FIELD_INDEX,
};
pub use addresses::validator::{validate, RejectReason};

pub use config::error::ConfigError;
pub use config::Settings;

pub use location::error::LocateError;
pub use location::resolver::{
    locate_all, GeoIpResolver, LatLon, Located, LocatedAddresses, LocationResolver,
};

pub use forecast::cache::ForecastCache;
pub use forecast::client::{Forecast, ForecastClient, ForecastDay};
pub use forecast::error::FetchError;
pub use forecast::openweather::{OpenWeatherClient, Units, DEFAULT_BASE_URL};
pub use forecast::pipeline::{
    AbortReason, ForecastPipeline, ForecastRun, RunCounters, DEFAULT_CALL_CEILING,
    DEFAULT_THROTTLE,
};

pub use histogram::builder::{build as build_histogram, HistogramBucket};
pub use histogram::error::HistogramError;
pub use histogram::writer::{render as render_histogram, write_histogram};

pub use report::{format_hms, Reporter, StepSummary};
