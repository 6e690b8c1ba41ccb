//! Command-line front end for mapclean
//!
//! Loads a PLY map, runs the neighbor-density filter and writes the cleaned
//! cloud with the same vertex layout.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn, LevelFilter};
use mapclean_algorithms::{DensityFilter, DensityFilterConfig, FilterReport};
use mapclean_core::Error;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Remove isolated points and origin sentinels from a point cloud
#[derive(Parser, Debug, Clone)]
#[command(name = "mapclean", version, author, long_about = None)]
pub struct Args {
    /// Point cloud to clean (.ply)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Where to write the cleaned cloud (.ply)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Neighbor search radius, in the cloud's units
    #[arg(short, long, default_value_t = 0.07, allow_negative_numbers = true)]
    pub radius: f64,

    /// Minimum number of points within the radius, the point itself included
    #[arg(short, long, default_value_t = 8)]
    pub min_neighbors: usize,

    /// Count neighbors on multiple threads
    #[arg(long, default_value_t = false)]
    pub parallel: bool,

    /// Worker threads for --parallel (default: one per core)
    #[arg(long, requires = "parallel")]
    pub threads: Option<usize>,

    /// Write an empty cloud instead of failing when nothing survives
    #[arg(long, default_value_t = false)]
    pub allow_empty: bool,

    /// Also write a JSON summary of the run to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Level to force on the logger, if any.
    ///
    /// `-v` always wins; otherwise an explicit `RUST_LOG` is left alone.
    pub fn log_level_override(&self, env_filter_set: bool) -> Option<LevelFilter> {
        if self.verbose > 0 || !env_filter_set {
            Some(self.log_level())
        } else {
            None
        }
    }

    pub fn filter_config(&self) -> DensityFilterConfig {
        DensityFilterConfig::new(self.min_neighbors, self.radius).with_parallel(self.parallel)
    }
}

/// What `--report` writes
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub config: DensityFilterConfig,
    #[serde(flatten)]
    pub report: FilterReport,
}

/// Load, filter and save according to `args`
pub fn run(args: &Args) -> Result<FilterReport> {
    let filter = DensityFilter::new(args.filter_config()).context("invalid filter configuration")?;

    info!("Loading point cloud from: {}", args.input.display());
    let input = mapclean_io::read_records(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    info!(
        "Loaded {} points with {} values each",
        input.cloud.len(),
        input.properties.len()
    );

    let (filtered, report) = match args.threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|i| format!("mapclean-{}", i))
                .build()
                .context("failed to start worker threads")?;
            pool.install(|| filter.apply_with_report(&input.cloud))?
        }
        None => filter.apply_with_report(&input.cloud)?,
    };

    if filtered.is_empty() {
        if !args.allow_empty {
            return Err(Error::EmptyResult.into());
        }
        warn!("No points remain after filtering; writing an empty cloud");
    }

    let output = input.with_cloud(filtered)?;
    mapclean_io::write_records(&output, &args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!(
        "Saved {} points to: {}",
        output.cloud.len(),
        args.output.display()
    );

    if let Some(path) = &args.report {
        let summary = RunSummary {
            input: &args.input,
            output: &args.output,
            config: *filter.config(),
            report,
        };
        let json = serde_json::to_string_pretty(&summary).context("failed to encode run report")?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote run report to: {}", path.display());
    }

    Ok(report)
}
