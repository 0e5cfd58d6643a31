//! Sequential, throttled forecast acquisition.
//!
//! Each located address costs at most one provider call; repeats are served
//! from the cache. The loop stops early, keeping what it already collected,
//! when the per-run call ceiling is reached or the provider reports a quota
//! error.

use crate::forecast::cache::ForecastCache;
use crate::forecast::client::ForecastClient;
use crate::forecast::throttle::Throttle;
use crate::location::resolver::Located;
use crate::report::{format_hms, percentage, StepSummary};
use bon::bon;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_CALL_CEILING: u32 = 1000;
pub const DEFAULT_THROTTLE: Duration = Duration::from_secs(1);

const PROGRESS_EVERY: usize = 5;
const LARGE_RUN: usize = 500;
// Rough provider round trip, used for the up-front estimate only
const EXPECTED_RESPONSE_TIME: Duration = Duration::from_millis(500);

/// Why the loop stopped before the last address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// The configured per-run call ceiling was reached.
    QuotaCeiling,
    /// The provider reported quota, rate limit or key exhaustion.
    ProviderQuota(String),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::QuotaCeiling => f.write_str("per-run call ceiling reached"),
            AbortReason::ProviderQuota(message) => write!(f, "provider quota exceeded ({message})"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// Located addresses offered to the run.
    pub total: usize,
    /// Remote calls actually issued.
    pub attempts: usize,
    pub successes: usize,
    pub cache_hits: usize,
    pub failures: usize,
    pub throttle_waits: usize,
    pub abort: Option<AbortReason>,
}

#[derive(Debug, Clone)]
pub struct ForecastRun {
    /// Next-day highs in input order, cache hits included.
    pub temperatures: Vec<f64>,
    pub counters: RunCounters,
    pub elapsed: Duration,
}

impl ForecastRun {
    pub fn summary(&self) -> StepSummary {
        StepSummary::new(
            "Obtaining Next Day Forecast High Temperatures From Web Service",
            "Forecast High Temperature",
            self.counters.attempts,
            self.counters.failures,
            self.elapsed,
        )
        .with_total(self.counters.total)
        .with_cached(self.counters.cache_hits)
    }
}

pub struct ForecastPipeline<C> {
    client: C,
    cache: ForecastCache,
    throttle: Throttle,
    call_ceiling: u32,
}

#[bon]
impl<C: ForecastClient> ForecastPipeline<C> {
    #[builder]
    pub fn new(
        client: C,
        #[builder(default = DEFAULT_THROTTLE)] throttle: Duration,
        #[builder(default = DEFAULT_CALL_CEILING)] call_ceiling: u32,
    ) -> Self {
        Self {
            client,
            cache: ForecastCache::new(),
            throttle: Throttle::new(throttle),
            call_ceiling,
        }
    }

    pub fn cache(&self) -> &ForecastCache {
        &self.cache
    }

    /// Fetches the next-day high at every location, in order. "Next day" is
    /// the day after `now` on each location's own calendar.
    ///
    /// Never fails: per-address problems are counted in the returned
    /// [`RunCounters`], and an early stop is recorded in `abort`.
    pub async fn run(&mut self, locations: &[Located], now: DateTime<Utc>) -> ForecastRun {
        let started = Instant::now();
        let waits_before = self.throttle.waits();
        let total = locations.len();
        let mut counters = RunCounters {
            total,
            ..Default::default()
        };
        let mut temperatures = Vec::with_capacity(total);

        self.announce(total);

        for (index, target) in locations.iter().enumerate() {
            if counters.attempts >= self.call_ceiling as usize {
                warn!(
                    "Reached the ceiling of {} forecast calls for this run, stopping after {} of {} locations",
                    self.call_ceiling, index, total
                );
                counters.abort = Some(AbortReason::QuotaCeiling);
                break;
            }

            if let Some(high) = self.cache.get(&target.address) {
                debug!("Cache hit for {}: {:.2}", target.address, high);
                temperatures.push(high);
                counters.cache_hits += 1;
                report_progress(index + 1, total, started);
                continue;
            }

            counters.attempts += 1;
            match self.client.fetch_forecast(target).await {
                Ok(forecast) => match forecast.high_tomorrow(now) {
                    Some(high) => {
                        temperatures.push(high);
                        self.cache.insert(target.address, high);
                        counters.successes += 1;
                    }
                    None => {
                        counters.failures += 1;
                        warn!(
                            "Forecast for {} has no entry for the next day. Skipping...",
                            target.address
                        );
                    }
                },
                Err(e) if e.is_fatal() => {
                    error!("{}. No further forecasts will be requested this run", e);
                    counters.abort = Some(AbortReason::ProviderQuota(e.to_string()));
                    break;
                }
                Err(e) => {
                    counters.failures += 1;
                    warn!("Forecast for {} failed: {}. Skipping...", target.address, e);
                }
            }

            report_progress(index + 1, total, started);
            self.throttle.wait().await;
        }

        counters.throttle_waits = self.throttle.waits() - waits_before;
        ForecastRun {
            temperatures,
            counters,
            elapsed: started.elapsed(),
        }
    }

    fn announce(&self, total: usize) {
        let estimate = (self.throttle.delay() + EXPECTED_RESPONSE_TIME)
            .saturating_mul(u32::try_from(total).unwrap_or(u32::MAX));
        info!(
            "Getting forecast info from service for [{}] locations. This will take approximately [{}]",
            total,
            format_hms(estimate)
        );
        if total > LARGE_RUN {
            info!("NOTE: This is a large dataset! You might want to go get a cup of coffee...");
        }
    }
}

fn report_progress(current: usize, total: usize, started: Instant) {
    if current % PROGRESS_EVERY == 0 {
        info!(
            "Processing [{}] of [{}] - [{:.2}%] complete - Elapsed time [{}]",
            current,
            total,
            percentage(current, total),
            format_hms(started.elapsed())
        );
    }
}
