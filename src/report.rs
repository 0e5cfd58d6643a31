//! Step summaries and the console reporter that renders them.

use log::{debug, log, Level, LevelFilter};
use std::fmt;
use std::time::Duration;

const RULE: &str = "-----------------------------------------";

/// Outcome of one processing stage, rendered once the stage finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSummary {
    pub title: String,
    /// Short label for the items handled, e.g. "Log file IPs".
    pub description: String,
    pub attempted: usize,
    pub failures: usize,
    /// Items offered to the stage, when that differs from `attempted`.
    pub total: Option<usize>,
    pub cached: Option<usize>,
    pub elapsed: Duration,
}

impl StepSummary {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        attempted: usize,
        failures: usize,
        elapsed: Duration,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            attempted,
            failures,
            total: None,
            cached: None,
            elapsed,
        }
    }

    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_cached(mut self, cached: usize) -> Self {
        self.cached = Some(cached);
        self
    }

    /// Share of attempts that failed, in percent. Zero when nothing was attempted.
    pub fn failure_percentage(&self) -> f64 {
        percentage(self.failures, self.attempted)
    }
}

impl fmt::Display for StepSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "- STEP SUMMARY : [{}]", self.title)?;
        if let Some(total) = self.total {
            writeln!(f, "- {} total [{}]", self.description, total)?;
        }
        writeln!(f, "- {} attempted [{}]", self.description, self.attempted)?;
        writeln!(f, "- {} failures [{}]", self.description, self.failures)?;
        writeln!(
            f,
            "- {} failed: [{:.2}%]",
            self.description,
            self.failure_percentage()
        )?;
        if let Some(cached) = self.cached {
            writeln!(f, "- {} cache hits [{}]", self.description, cached)?;
        }
        writeln!(f, "- [ {} ] Time elapsed", format_hms(self.elapsed))?;
        write!(f, "{RULE}")
    }
}

pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Formats a duration as `HH:MM:SS`, hours not wrapping at 24.
pub fn format_hms(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Renders step summaries for the user.
///
/// Summaries go to stdout unless `quiet` is set, in which case they are
/// logged at warn level, the one level quiet runs still show. With `debug`
/// on, each stage's data is logged as well.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    pub quiet: bool,
    pub debug: bool,
}

impl Reporter {
    pub fn new(quiet: bool, debug: bool) -> Self {
        Self { quiet, debug }
    }

    /// Most verbose level to enable for this crate's logs.
    pub fn level_filter(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Info
        }
    }

    fn summary_level(&self) -> Level {
        if self.quiet {
            Level::Warn
        } else {
            Level::Info
        }
    }

    pub fn step(&self, summary: &StepSummary) {
        if self.quiet {
            log!(
                self.summary_level(),
                "{}: attempted {}, failed {} ({:.2}%), elapsed {}",
                summary.title,
                summary.attempted,
                summary.failures,
                summary.failure_percentage(),
                format_hms(summary.elapsed)
            );
        } else {
            println!("{summary}");
        }
    }

    pub fn data<T: fmt::Debug + ?Sized>(&self, description: &str, data: &T) {
        if self.debug {
            debug!("{} data [{:?}]", description, data);
        }
    }

    pub fn finished(&self) {
        if !self.quiet {
            println!("{RULE}");
            println!("\n -> Process Complete!!!");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hms_formatting() {
        assert_eq!(format_hms(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_hms(Duration::from_millis(61_900)), "00:01:01");
        assert_eq!(format_hms(Duration::from_secs(90_061)), "25:01:01");
    }

    #[test]
    fn failure_percentage_handles_zero_attempts() {
        let summary = StepSummary::new("t", "d", 0, 0, Duration::ZERO);
        assert_eq!(summary.failure_percentage(), 0.0);

        let summary = StepSummary::new("t", "d", 8, 2, Duration::ZERO);
        assert_eq!(summary.failure_percentage(), 25.0);
    }

    #[test]
    fn quiet_summaries_pass_the_quiet_filter() {
        for (quiet, debug) in [(true, false), (false, false), (false, true), (true, true)] {
            let reporter = Reporter::new(quiet, debug);
            assert!(
                reporter.summary_level() <= reporter.level_filter(),
                "summaries hidden for quiet={quiet} debug={debug}"
            );
        }
        assert_eq!(Reporter::new(true, false).level_filter(), LevelFilter::Warn);
    }

    #[test]
    fn rendered_summary_lists_counts() {
        let summary = StepSummary::new(
            "Obtaining Next Day Forecast High Temperatures From Web Service",
            "Forecast High Temperature",
            3,
            1,
            Duration::from_secs(4),
        )
        .with_cached(2);

        let rendered = summary.to_string();
        assert!(rendered.contains("- Forecast High Temperature attempted [3]"));
        assert!(rendered.contains("- Forecast High Temperature failed: [33.33%]"));
        assert!(rendered.contains("cache hits [2]"));
        assert!(rendered.contains("[ 00:00:04 ] Time elapsed"));
    }
}
