//! Day-windowed exchange-rate aggregation.
//!
//! The [`Aggregator`] turns a requested day count into at most
//! [`MAX_WINDOW_DAYS`] rate-source fetches, one per calendar day counting
//! back from today, and folds the answers into an ordered list of
//! [`DailyReport`]s. A day whose fetch fails, times out, or lacks a tracked
//! currency is logged and left out; aggregation itself never fails.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ratecast_core::{Aggregator, InterestSet, PrivatBankSource};
//!
//! let aggregator = Aggregator::new(Arc::new(PrivatBankSource::default()), InterestSet::default());
//! let text = aggregator.report(3).await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{info, warn};

use crate::rate_source::RateSource;
use crate::{DailyReport, InterestSet, ReportDate};

/// Upper bound on the number of days one request may cover.
pub const MAX_WINDOW_DAYS: u32 = 10;

/// Effective day window derived from a user-supplied count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationWindow {
    requested: i64,
    days: u32,
}

impl AggregationWindow {
    pub fn new(requested: i64) -> Self {
        let days = requested.clamp(0, i64::from(MAX_WINDOW_DAYS)) as u32;
        Self { requested, days }
    }

    pub const fn requested(self) -> i64 {
        self.requested
    }

    /// Number of days that will actually be fetched.
    pub const fn days(self) -> u32 {
        self.days
    }

    pub fn is_clamped(self) -> bool {
        self.requested > i64::from(MAX_WINDOW_DAYS)
    }

    /// Dates covered by the window, most recent first.
    pub fn dates(self, today: ReportDate) -> Vec<ReportDate> {
        (0..self.days)
            .filter_map(|offset| today.days_before(offset))
            .collect()
    }
}

/// Stateless driver over a shared [`RateSource`].
#[derive(Clone)]
pub struct Aggregator {
    source: Arc<dyn RateSource>,
    interest: InterestSet,
    fetch_timeout: Duration,
}

impl Aggregator {
    pub fn new(source: Arc<dyn RateSource>, interest: InterestSet) -> Self {
        Self {
            source,
            interest,
            fetch_timeout: Duration::from_secs(5),
        }
    }

    /// Bound each per-date fetch regardless of the source's own timeout.
    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn interest(&self) -> &InterestSet {
        &self.interest
    }

    /// Reports for the `requested` days ending today.
    pub async fn aggregate(&self, requested: i64) -> Vec<DailyReport> {
        self.aggregate_from(ReportDate::today(), requested).await
    }

    /// Reports for the `requested` days ending at `today`, most recent first.
    ///
    /// Fetches run concurrently; output order follows the window, not
    /// completion order.
    pub async fn aggregate_from(&self, today: ReportDate, requested: i64) -> Vec<DailyReport> {
        let window = AggregationWindow::new(requested);
        if window.is_clamped() {
            info!(
                requested = window.requested(),
                effective = window.days(),
                "exchange window limited to {MAX_WINDOW_DAYS} days"
            );
        }

        let fetches = window
            .dates(today)
            .into_iter()
            .map(|date| self.fetch_report(date));

        join_all(fetches).await.into_iter().flatten().collect()
    }

    /// Rendered report text for the `requested` days ending today.
    pub async fn report(&self, requested: i64) -> String {
        render(&self.aggregate(requested).await)
    }

    async fn fetch_report(&self, date: ReportDate) -> Option<DailyReport> {
        let rates = match tokio::time::timeout(self.fetch_timeout, self.source.daily_rates(date)).await
        {
            Ok(Ok(rates)) => rates,
            Ok(Err(error)) => {
                warn!(%date, code = error.code(), %error, "omitting date from exchange report");
                return None;
            }
            Err(_) => {
                warn!(
                    %date,
                    timeout_ms = self.fetch_timeout.as_millis() as u64,
                    "rate source fetch timed out; omitting date"
                );
                return None;
            }
        };

        match DailyReport::filter(&rates, &self.interest) {
            Ok(report) => Some(report),
            Err(missing) => {
                let missing = missing
                    .iter()
                    .map(|code| code.as_str())
                    .collect::<Vec<_>>()
                    .join(",");
                warn!(%date, %missing, "tracked currencies absent; omitting date");
                None
            }
        }
    }
}

/// Join reports into broadcast text: each date line followed by its
/// currencies, reports separated by a line break.
pub fn render(reports: &[DailyReport]) -> String {
    reports
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
