use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fanout-batch")]
#[command(about = "Deadline-bounded fan-out of range batches")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the ranges a batch would be split into, as JSON
    Plan {
        /// Total number of items
        #[arg(short, long)]
        total: usize,

        /// Items per range (0 = one range for everything)
        #[arg(short, long, default_value = "0")]
        unit: usize,
    },

    /// Run a synthetic `value * 10` workload over the batch and print a summary
    Run {
        /// JSON batch config; command-line values override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Total number of items
        #[arg(short, long)]
        total: Option<usize>,

        /// Items per range (0 = one range for everything)
        #[arg(short, long)]
        unit: Option<usize>,

        /// Overall deadline in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Range (by start offset) whose producer sleeps before returning
        #[arg(long, requires = "slow_ms")]
        slow_range: Option<usize>,

        /// How long the slow range sleeps, in milliseconds
        #[arg(long)]
        slow_ms: Option<u64>,

        /// Range (by start offset) whose producer reports an error
        #[arg(long)]
        fail_range: Option<usize>,

        /// Make workers share the overall deadline instead of timing themselves
        #[arg(long)]
        overall_deadline: bool,
    },
}
