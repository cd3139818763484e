// src/main.rs
use std::{thread, time::Duration};

use anyhow::{anyhow, Result};
use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use fanout_batch::batch::BatchConfig;
use fanout_batch::cli::{Cli, Commands};
use fanout_batch::utils::logging::init_logging;
use fanout_batch::{partition, Context, Range, WorkerDeadline};

#[derive(Serialize, Debug, Default)]
struct RunSummary {
    ranges: usize,
    consumed_ranges: usize,
    consumed_items: usize,
    sum: u64,
    failed_ranges: Vec<Range>,
    panicked_ranges: Vec<Range>,
    collected_before_stop: Option<usize>,
    error: Option<String>,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Plan { total, unit } => {
            let ranges = partition(total, unit);
            println!("{}", serde_json::to_string_pretty(&ranges)?);
        }
        Commands::Run {
            config,
            total,
            unit,
            timeout_ms,
            slow_range,
            slow_ms,
            fail_range,
            overall_deadline,
        } => {
            let mut config = match (config, total) {
                (Some(path), _) => BatchConfig::load(path)?,
                (None, Some(total_count)) => BatchConfig::new(total_count),
                (None, None) => return Err(anyhow!("either --config or --total is required")),
            };
            if let Some(total_count) = total {
                config.total_count = total_count;
            }
            if let Some(unit_size) = unit {
                config.unit_size = unit_size;
            }
            if let Some(timeout_ms) = timeout_ms {
                config.timeout_ms = timeout_ms;
            }
            if overall_deadline {
                config.worker_deadline = WorkerDeadline::Overall;
            }

            let summary = run_workload(&config, slow_range.zip(slow_ms), fail_range);
            println!("{}", serde_json::to_string_pretty(&summary)?);

            if let Some(err) = summary.error {
                return Err(anyhow!(err));
            }
        }
    }

    Ok(())
}

fn run_workload(
    config: &BatchConfig,
    slow: Option<(usize, u64)>,
    fail_range: Option<usize>,
) -> RunSummary {
    let batch = config.to_batch();
    let mut summary = RunSummary {
        ranges: batch.ranges().len(),
        ..RunSummary::default()
    };

    info!(
        total_count = batch.total_count(),
        unit_size = batch.unit_size(),
        ranges = summary.ranges,
        "Running synthetic workload"
    );

    let result = batch.run(
        &Context::background(),
        move |_ctx, range: Range| {
            if let Some((from, millis)) = slow {
                if range.from == from {
                    thread::sleep(Duration::from_millis(millis));
                }
            }
            if fail_range == Some(range.from) {
                return Err(format!("range {} failed on request", range.from));
            }
            Ok(range
                .indices()
                .into_par_iter()
                .map(|value| value as u64 * 10)
                .sum::<u64>())
        },
        |_ctx, range, outcome| match outcome {
            Ok(sum) => {
                summary.consumed_ranges += 1;
                summary.consumed_items += range.count;
                summary.sum += sum;
            }
            Err(err) if err.is_panic() => summary.panicked_ranges.push(range),
            Err(_) => summary.failed_ranges.push(range),
        },
    );

    if let Err(err) = result {
        summary.collected_before_stop = err.collected();
        summary.error = Some(err.to_string());
    }
    summary
}
