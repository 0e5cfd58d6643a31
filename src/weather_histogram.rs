//! Runs the whole job: log file in, histogram file out.
//!
//! Stages run in order and each one reports a [`StepSummary`] before the next
//! starts. Per-address problems never stop the run; only unreadable input and
//! an empty forecast set do.

use crate::addresses::log_parser::{parse_log_file, DEFAULT_FIELD_INDEX};
use crate::error::WeatherHistogramError;
use crate::forecast::client::ForecastClient;
use crate::forecast::pipeline::{ForecastPipeline, RunCounters};
use crate::histogram::builder::{build, HistogramBucket};
use crate::histogram::error::HistogramError;
use crate::histogram::writer::write_histogram;
use crate::location::resolver::{locate_all, LocationResolver};
use crate::report::{Reporter, StepSummary};
use bon::bon;
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::path::Path;
use std::time::Instant;

/// Everything a finished run produced, for callers that want more than the file.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub steps: Vec<StepSummary>,
    pub counters: RunCounters,
    pub buckets: Vec<HistogramBucket>,
}

/// The end-to-end job, generic over where locations and forecasts come from.
///
/// # Examples
///
/// ```no_run
/// # use weather_histogram::*;
/// # use std::path::Path;
/// # #[tokio::main]
/// # async fn main() -> Result<(), WeatherHistogramError> {
/// let client = OpenWeatherClient::builder()
///     .base_url(DEFAULT_BASE_URL)
///     .api_key("my-key")
///     .build()
///     .map_err(WeatherHistogramError::HttpClient)?;
///
/// let mut job = WeatherHistogram::builder()
///     .resolver(GeoIpResolver::open(Path::new("files/GeoLite2-City.mmdb"))?)
///     .pipeline(ForecastPipeline::builder().client(client).build())
///     .build();
///
/// let report = job
///     .run(Path::new("access.log"), Path::new("histogram.tsv"), 5)
///     .await?;
/// println!("{} buckets written", report.buckets.len());
/// # Ok(())
/// # }
/// ```
pub struct WeatherHistogram<R, C> {
    resolver: R,
    pipeline: ForecastPipeline<C>,
    field_index: usize,
    delimiter: char,
    reporter: Reporter,
}

#[bon]
impl<R: LocationResolver, C: ForecastClient> WeatherHistogram<R, C> {
    #[builder]
    pub fn new(
        resolver: R,
        pipeline: ForecastPipeline<C>,
        #[builder(default = DEFAULT_FIELD_INDEX)] field_index: usize,
        #[builder(default = '\t')] delimiter: char,
        #[builder(default)] reporter: Reporter,
    ) -> Self {
        Self {
            resolver,
            pipeline,
            field_index,
            delimiter,
            reporter,
        }
    }

    /// Runs every stage, taking the next-day forecast as of the current time.
    ///
    /// # Errors
    ///
    /// Fails when the log cannot be read, when `bucket_count` is zero, when
    /// no forecast was collected, or when the output cannot be written. In
    /// the last three cases no output file is created.
    pub async fn run(
        &mut self,
        log_path: &Path,
        output_path: &Path,
        bucket_count: usize,
    ) -> Result<RunReport, WeatherHistogramError> {
        self.run_at(log_path, output_path, bucket_count, Utc::now())
            .await
    }

    /// Same as [`run`](Self::run) with an explicit current time. The forecast
    /// day is the day after `now` at each location.
    pub async fn run_at(
        &mut self,
        log_path: &Path,
        output_path: &Path,
        bucket_count: usize,
        now: DateTime<Utc>,
    ) -> Result<RunReport, WeatherHistogramError> {
        // Checked before any provider call is spent.
        if bucket_count == 0 {
            return Err(HistogramError::InvalidBucketCount(bucket_count).into());
        }
        let mut steps = Vec::with_capacity(4);

        let started = Instant::now();
        let parsed = parse_log_file(log_path, self.field_index).await?;
        let summary = StepSummary::new(
            "Processing IPs From Local Log File",
            "Log file IPs",
            parsed.candidates(),
            parsed.rejections.len(),
            started.elapsed(),
        );
        self.reporter.step(&summary);
        self.reporter.data("Log file IPs", &parsed.addresses);
        steps.push(summary);

        let located = locate_all(&self.resolver, &parsed.addresses);
        self.reporter.step(&located.summary);
        self.reporter.data("Locations Lookup DB", &located.located);
        steps.push(located.summary);

        let run = self.pipeline.run(&located.located, now).await;
        let summary = run.summary();
        self.reporter.step(&summary);
        self.reporter.data("Forecast High Temperature", &run.temperatures);
        steps.push(summary);
        if let Some(reason) = &run.counters.abort {
            warn!(
                "Forecast requests stopped early ({}); building the histogram from {} values",
                reason,
                run.temperatures.len()
            );
        }

        let started = Instant::now();
        let buckets = build(&run.temperatures, bucket_count)?;
        write_histogram(output_path, &buckets, self.delimiter)?;
        let summary = StepSummary::new(
            format!("Creating Histogram TSV File {}", output_path.display()),
            "TSV file",
            buckets.len(),
            0,
            started.elapsed(),
        );
        self.reporter.step(&summary);
        self.reporter.data("TSV file", &buckets);
        steps.push(summary);
        self.reporter.finished();

        info!(
            "Histogram of {} forecasts in {} buckets written to {}",
            run.temperatures.len(),
            buckets.len(),
            output_path.display()
        );
        Ok(RunReport {
            steps,
            counters: run.counters,
            buckets,
        })
    }
}
