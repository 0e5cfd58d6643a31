//! create-weather-histogram
//!
//! Usage:
//!   create-weather-histogram access.log histogram.tsv 5
//!   create-weather-histogram access.log histogram.tsv 10 --debug --config weather.toml

use clap::{Parser, ValueEnum};
use log::{error, warn};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use weather_histogram::{
    ForecastPipeline, GeoIpResolver, OpenWeatherClient, Reporter, RunReport, Settings,
    WeatherHistogram, WeatherHistogramError,
};

/// Creates a tsv file of histogram bins of next-day forecast highs for the
/// client IP addresses found in a log file.
#[derive(Parser, Debug)]
#[command(name = "create-weather-histogram", version, about)]
struct Args {
    /// Log file containing the client addresses to find forecasts for
    logfile: PathBuf,

    /// File to write the histogram to (replaced if it exists)
    outputfile: PathBuf,

    /// Number of buckets for the histogram
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    buckets: u32,

    /// Show more informational messages for debugging
    #[arg(short, long)]
    debug: bool,

    /// Only log warnings and errors; step summaries are logged as warnings
    #[arg(short, long, conflicts_with = "debug")]
    quiet: bool,

    /// Config file (TOML). Defaults to ./weather-histogram.toml or the user config dir
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Zero-based column of the client address, overriding the config
    #[arg(long)]
    field_index: Option<usize>,

    /// Column separator for the output file
    #[arg(long, value_enum, default_value_t = Delimiter::Tab)]
    delimiter: Delimiter,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Delimiter {
    Tab,
    Comma,
}

impl Delimiter {
    fn as_char(self) -> char {
        match self {
            Delimiter::Tab => '\t',
            Delimiter::Comma => ',',
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let reporter = Reporter::new(args.quiet, args.debug);
    let log_level = reporter.level_filter().as_str().to_ascii_lowercase();
    let filter = format!("warn,weather_histogram={log_level},create_weather_histogram={log_level}");
    env_logger::init_from_env(env_logger::Env::default().default_filter_or(filter));

    match run(args, reporter).await {
        Ok(report) => {
            if let Some(reason) = &report.counters.abort {
                warn!("Run finished with partial results: {}", reason);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                error!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, reporter: Reporter) -> Result<RunReport, WeatherHistogramError> {
    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(field_index) = args.field_index {
        settings.field_index = field_index;
    }

    let resolver = GeoIpResolver::open(&settings.geoip_db)?;
    let client = OpenWeatherClient::builder()
        .base_url(settings.base_url.as_str())
        .api_key(settings.api_key.as_str())
        .units(settings.units)
        .timeout(settings.timeout())
        .build()
        .map_err(WeatherHistogramError::HttpClient)?;
    let pipeline = ForecastPipeline::builder()
        .client(client)
        .throttle(settings.throttle())
        .call_ceiling(settings.call_ceiling)
        .build();

    let mut job = WeatherHistogram::builder()
        .resolver(resolver)
        .pipeline(pipeline)
        .field_index(settings.field_index)
        .delimiter(args.delimiter.as_char())
        .reporter(reporter)
        .build();

    job.run(&args.logfile, &args.outputfile, args.buckets as usize)
        .await
}
