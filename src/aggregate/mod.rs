//! Per-point lookups merged into a deduplicated result set.
//!
//! Lookups run through a bounded pool (`buffer_unordered`). Completed
//! lookups are merged by this single loop, so the result set needs no lock.
//! Ties between records sharing an id are broken by generation order, which
//! keeps the output independent of completion order.

mod extract;

use std::time::Duration;

use futures::future::{self, FutureExt};
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::cancel::CancelSignal;
use crate::error::LookupError;
use crate::lookup::FacilityLookup;
use crate::models::{Occurrence, ResultSet, SamplePoint};

pub use extract::{extract_records, Extracted};

const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Counters for one aggregation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub points_total: usize,
    pub points_succeeded: usize,
    pub points_failed: usize,
    /// Points never dispatched because the run was cancelled
    pub points_skipped: usize,
    pub malformed_features: usize,
    pub records: usize,
    pub duplicates: usize,
}

/// Runs lookups for every sample point and collects the results
pub struct Aggregator {
    concurrency: usize,
    lookup_timeout: Duration,
    progress: ProgressBar,
    cancel: Option<CancelSignal>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(1, DEFAULT_LOOKUP_TIMEOUT)
    }
}

impl Aggregator {
    /// `concurrency` of 1 issues lookups strictly one after another
    pub fn new(concurrency: usize, lookup_timeout: Duration) -> Self {
        Self {
            concurrency: concurrency.max(1),
            lookup_timeout,
            progress: ProgressBar::hidden(),
            cancel: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Look up every point and merge the returned facilities.
    ///
    /// Failed points contribute nothing and are counted in the stats; the
    /// run itself never fails.
    pub async fn aggregate<L>(&self, points: &[SamplePoint], lookup: &L) -> (ResultSet, RunStats)
    where
        L: FacilityLookup + ?Sized,
    {
        let mut results = ResultSet::new();
        let mut stats = RunStats {
            points_total: points.len(),
            ..RunStats::default()
        };

        let cancelled = match &self.cancel {
            Some(signal) => signal.clone().cancelled().boxed(),
            None => future::pending::<()>().boxed(),
        };
        let timeout = self.lookup_timeout;

        let mut outcomes = stream::iter(points.iter().copied().enumerate())
            .take_until(cancelled)
            .map(|(index, point)| async move {
                let outcome = match tokio::time::timeout(timeout, lookup.lookup(point)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(LookupError::Timeout(timeout)),
                };
                (index, point, outcome)
            })
            .buffer_unordered(self.concurrency);

        while let Some((index, point, outcome)) = outcomes.next().await {
            self.progress.inc(1);

            let extracted = outcome.and_then(|payload| extract_records(point, &payload));
            match extracted {
                Ok(extracted) => {
                    stats.points_succeeded += 1;
                    stats.malformed_features += extracted.malformed;
                    let found = extracted.records.len();
                    for (feature, record) in extracted.records {
                        results.insert(Occurrence::new(index, feature), record);
                    }
                    debug!(
                        "Point {} ({}, {}) returned {} facilities",
                        index, point.lon, point.lat, found
                    );
                }
                Err(e) => {
                    stats.points_failed += 1;
                    warn!(
                        "Point {} ({}, {}) failed: {}",
                        index,
                        point.lon,
                        point.lat,
                        truncate(&e.to_string(), 300)
                    );
                }
            }
        }

        stats.points_skipped = stats.points_total - stats.points_succeeded - stats.points_failed;
        stats.records = results.len();
        stats.duplicates = results.duplicates();

        if stats.points_skipped > 0 {
            warn!(
                "Run cancelled: {} of {} points were not looked up",
                stats.points_skipped, stats.points_total
            );
        }
        info!(
            "Lookups finished: {} succeeded, {} failed, {} unique facilities ({} duplicates)",
            stats.points_succeeded, stats.points_failed, stats.records, stats.duplicates
        );

        (results, stats)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max).collect::<String>() + "..."
}
