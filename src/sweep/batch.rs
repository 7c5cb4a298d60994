use crate::config::{Config, RegionConfig};
use anyhow::Result;
use gridsweep::cancel::CancelSignal;
use gridsweep::lookup::FacilityLookup;
use gridsweep::pipeline::{Pipeline, RunConfig, RunReport};
use gridsweep::sink::ResultSink;
use std::time::Duration;
use tracing::{error, info, warn};

pub struct BatchOptions {
    pub dry_run: bool,
    pub show_progress: bool,
    /// Deadline for one point, retries included
    pub lookup_timeout: Duration,
}

/// What a batch produced
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub reports: Vec<RunReport>,
    /// Regions whose sample grid was written in dry-run mode
    pub planned: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// Regions that wrote an output file
    pub fn written(&self) -> usize {
        self.reports.len() + self.planned
    }
}

/// Run every region in order. A failing region is logged and skipped.
pub async fn run_batch<L, S>(
    config: &Config,
    regions: &[RegionConfig],
    lookup: &L,
    sink: &mut S,
    cancel: CancelSignal,
    options: &BatchOptions,
) -> Result<BatchSummary>
where
    L: FacilityLookup + ?Sized,
    S: ResultSink + ?Sized,
{
    info!("Starting batch for {} region(s)", regions.len());

    let mut summary = BatchSummary::default();

    for region in regions {
        if cancel.is_cancelled() {
            warn!("Cancelled, skipping remaining regions");
            break;
        }

        let run_config = RunConfig {
            spacing_meters: region.spacing_meters.unwrap_or(config.global.spacing_meters),
            concurrency: config.global.concurrency,
            lookup_timeout: options.lookup_timeout,
        };
        let pipeline = Pipeline::new(&config.global.boundary_file, run_config)
            .with_cancel(cancel.clone())
            .with_progress(options.show_progress);

        if options.dry_run {
            match pipeline.dry_run(&region.name, sink) {
                Ok(count) => {
                    info!("{}: {} sample points", region.name, count);
                    summary.planned += 1;
                }
                Err(e) => {
                    error!("Failed to plan {}: {}", region.name, e);
                    summary.failed += 1;
                }
            }
            continue;
        }

        match pipeline.run_region(&region.name, lookup, sink).await {
            Ok(report) => summary.reports.push(report),
            Err(e) => {
                error!("Region {} failed: {}", region.name, e);
                summary.failed += 1;
            }
        }
    }

    for report in &summary.reports {
        let s = &report.stats;
        info!(
            "{}: {} facilities from {} points ({} failed, {} skipped) in {}s",
            report.region,
            s.records,
            s.points_total,
            s.points_failed,
            s.points_skipped,
            (report.finished_at - report.started_at).num_seconds()
        );
    }

    if summary.failed > 0 && summary.failed == regions.len() {
        anyhow::bail!("All {} region(s) failed", summary.failed);
    }
    if summary.failed > 0 {
        warn!("{} region(s) failed", summary.failed);
    }

    Ok(summary)
}
