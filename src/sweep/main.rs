//! Region sweep CLI.
//!
//! Loads a region boundary, samples it with a point grid, queries the
//! facility service at every point and writes a CSV per region.

mod batch;
mod config;
mod interrupt;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use gridsweep::cancel::cancel_pair;
use gridsweep::lookup::HttpLookup;
use gridsweep::sink::CsvSink;

use crate::batch::{run_batch, BatchOptions};
use crate::config::{Config, RegionConfig};
use crate::interrupt::{watch_interrupts, FORCED_EXIT_CODE};

#[derive(Parser, Debug)]
#[command(name = "sweep")]
#[command(about = "Sample region boundaries with a point grid and collect facilities")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: PathBuf,

    /// Region to process (repeatable); overrides the configured regions
    #[arg(short, long)]
    region: Vec<String>,

    /// Grid spacing in meters; overrides the config for every region
    #[arg(long)]
    spacing: Option<f64>,

    /// Maximum lookups in flight
    #[arg(long)]
    concurrency: Option<usize>,

    /// Output directory for CSV files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Only generate and write the sample grid
    #[arg(long)]
    dry_run: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = Config::load_from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    if let Some(concurrency) = args.concurrency {
        config.global.concurrency = concurrency;
    }
    if let Some(dir) = &args.output_dir {
        config.global.output_dir = dir.clone();
    }

    let mut regions: Vec<RegionConfig> = if args.region.is_empty() {
        config.regions.clone()
    } else {
        args.region
            .iter()
            .map(|name| RegionConfig {
                name: name.clone(),
                spacing_meters: None,
            })
            .collect()
    };
    if let Some(spacing) = args.spacing {
        for region in &mut regions {
            region.spacing_meters = Some(spacing);
        }
    }
    if regions.is_empty() {
        anyhow::bail!("No regions configured; pass --region or add [[regions]] to the config");
    }

    info!("Gridsweep");
    info!("Boundary file: {}", config.global.boundary_file.display());

    let template = config
        .request
        .to_template()
        .context("Failed to build request template")?;
    info!("Lookup endpoint: {}", template.url);

    let lookup = HttpLookup::new(
        template,
        Duration::from_secs(config.global.request_timeout_secs),
    )?
    .with_retries(
        config.global.max_attempts,
        Duration::from_millis(config.global.retry_delay_ms),
    );

    let lookup_timeout = match config.global.lookup_timeout_secs {
        Some(secs) => {
            let timeout = Duration::from_secs(secs);
            if timeout < lookup.retry_budget() {
                warn!(
                    "lookup_timeout_secs ({}s) is below the retry budget ({:?}); retries may be cut off",
                    secs,
                    lookup.retry_budget()
                );
            }
            timeout
        }
        None => lookup.retry_budget(),
    };

    let mut sink =
        CsvSink::new(&config.global.output_dir).with_preview_rows(config.global.preview_rows);

    // First Ctrl-C stops dispatching new lookups and still writes results; a second one exits
    let (handle, signal) = cancel_pair();
    tokio::spawn(async move {
        if watch_interrupts(tokio::signal::ctrl_c, handle).await {
            std::process::exit(FORCED_EXIT_CODE);
        }
    });

    let options = BatchOptions {
        dry_run: args.dry_run,
        show_progress: !args.no_progress,
        lookup_timeout,
    };
    let summary = run_batch(&config, &regions, &lookup, &mut sink, signal, &options).await?;

    if args.dry_run {
        info!("Done: sample grids written for {} region(s)", summary.planned);
    } else {
        info!("Done: {} region(s) written", summary.written());
    }

    Ok(())
}
