//! Region pipeline: boundary → grid → lookups → aggregation → sink.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::aggregate::{Aggregator, RunStats};
use crate::boundary::load_boundary;
use crate::cancel::CancelSignal;
use crate::error::Result;
use crate::grid;
use crate::lookup::{FacilityLookup, HttpLookup, RequestTemplate};
use crate::models::SamplePoint;
use crate::sink::ResultSink;

/// Parameters shared by every region of a run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub spacing_meters: f64,
    pub concurrency: usize,
    pub lookup_timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            spacing_meters: 100.0,
            concurrency: 1,
            lookup_timeout: Duration::from_secs(30),
        }
    }
}

/// Outcome of one region
#[derive(Debug, Clone)]
pub struct RunReport {
    pub region: String,
    pub spacing_meters: f64,
    pub stats: RunStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Orchestrates one boundary dataset. Holds no state between runs.
pub struct Pipeline {
    boundary_file: PathBuf,
    config: RunConfig,
    cancel: Option<CancelSignal>,
    show_progress: bool,
}

impl Pipeline {
    pub fn new(boundary_file: impl Into<PathBuf>, config: RunConfig) -> Self {
        Self {
            boundary_file: boundary_file.into(),
            config,
            cancel: None,
            show_progress: false,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn boundary_file(&self) -> &Path {
        &self.boundary_file
    }

    /// Load the region and generate its sample points
    pub fn plan_region(&self, region: &str) -> Result<Vec<SamplePoint>> {
        let boundary = load_boundary(&self.boundary_file, region)?;
        grid::generate(&boundary, self.config.spacing_meters)
    }

    /// Generate the grid and hand it to the sink without any lookups
    pub fn dry_run<S>(&self, region: &str, sink: &mut S) -> Result<usize>
    where
        S: ResultSink + ?Sized,
    {
        let points = self.plan_region(region)?;
        sink.write_points(region, &points)?;
        Ok(points.len())
    }

    /// Run the full pipeline for a region.
    ///
    /// Boundary and grid errors abort the region. Lookup failures only show
    /// up in the report's stats; the sink always receives what was collected.
    pub async fn run_region<L, S>(
        &self,
        region: &str,
        lookup: &L,
        sink: &mut S,
    ) -> Result<RunReport>
    where
        L: FacilityLookup + ?Sized,
        S: ResultSink + ?Sized,
    {
        let started_at = Utc::now();
        info!("Starting region {}", region);

        let points = self.plan_region(region)?;

        let mut aggregator = Aggregator::new(self.config.concurrency, self.config.lookup_timeout)
            .with_progress(self.progress_bar(points.len() as u64));
        if let Some(cancel) = &self.cancel {
            aggregator = aggregator.with_cancel(cancel.clone());
        }

        let (results, stats) = aggregator.aggregate(&points, lookup).await;
        let records = results.into_records();
        sink.write_records(region, &records)?;

        info!(
            "Region {} complete: {}/{} points succeeded, {} failed, {} facilities",
            region, stats.points_succeeded, stats.points_total, stats.points_failed, stats.records
        );

        Ok(RunReport {
            region: region.to_string(),
            spacing_meters: self.config.spacing_meters,
            stats,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

/// Run one region against the HTTP facility service with default settings
pub async fn run<S>(
    region: &str,
    spacing_meters: f64,
    boundary_file: &Path,
    template: RequestTemplate,
    sink: &mut S,
) -> Result<RunReport>
where
    S: ResultSink + ?Sized,
{
    let mut config = RunConfig {
        spacing_meters,
        ..RunConfig::default()
    };
    // The default timeout bounds each HTTP attempt; the point deadline covers all retries
    let lookup = HttpLookup::new(template, config.lookup_timeout)?;
    config.lookup_timeout = lookup.retry_budget();
    Pipeline::new(boundary_file, config)
        .run_region(region, &lookup, sink)
        .await
}
