//! # Booking Batcher CLI
//!
//! Splits a booking CSV export into batch files and prints the job report
//! as JSON.

use std::path::PathBuf;
use std::process;

use booking_batcher::config::{BatchConfig, BatchProfile, PartitionStrategy};
use booking_batcher::job::run_job_file;
use clap::{Parser, ValueEnum};
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "booking-batcher")]
#[command(about = "Partition a booking export into per-property-capped batches")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Booking CSV file (header row, then property id, check-in, check-out, ...)
    input: PathBuf,

    /// Directory the batch files are written to
    #[arg(short, long)]
    out: PathBuf,

    /// Batch size preset
    #[arg(long, value_enum, default_value = "standard")]
    profile: ProfileArg,

    /// Maximum bookings per batch (overrides --profile)
    #[arg(long)]
    max_batch_size: Option<usize>,

    /// Maximum bookings per property within one batch
    #[arg(long, default_value_t = booking_batcher::config::DEFAULT_MAX_PER_PROPERTY)]
    max_per_property: usize,

    /// Base name of the batch files
    #[arg(short, long, default_value = booking_batcher::config::DEFAULT_BATCH_NAME)]
    name: String,

    /// How bookings are drained into batches
    #[arg(long, value_enum, default_value = "pool-scan")]
    strategy: StrategyArg,

    /// Field delimiter of the input and output files
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    /// 1,000 bookings per batch
    Standard,
    /// 250 bookings per batch
    Compact,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    PoolScan,
    RoundRobin,
}

impl Cli {
    fn to_config(&self) -> Result<BatchConfig, String> {
        if !self.delimiter.is_ascii() {
            return Err(format!("delimiter '{}' must be a single ASCII character", self.delimiter));
        }

        let profile = match (self.max_batch_size, self.profile) {
            (Some(size), _) => BatchProfile::Custom(size),
            (None, ProfileArg::Standard) => BatchProfile::Standard,
            (None, ProfileArg::Compact) => BatchProfile::Compact,
        };
        let strategy = match self.strategy {
            StrategyArg::PoolScan => PartitionStrategy::PoolScan,
            StrategyArg::RoundRobin => PartitionStrategy::RoundRobin,
        };

        Ok(BatchConfig::with_profile(profile)
            .max_per_property(self.max_per_property)
            .batch_name(self.name.clone())
            .delimiter(self.delimiter as u8)
            .strategy(strategy))
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: a tracing subscriber is already installed");
    }

    let config = match cli.to_config() {
        Ok(config) => config,
        Err(message) => {
            error!("{}", message);
            eprintln!("error: {}", message);
            process::exit(2);
        }
    };

    match run_job_file(&cli.input, &cli.out, config).await {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: failed to render report: {}", e);
                process::exit(1);
            }
        },
        Err(err) => {
            error!(error = %err, "Batching job failed");
            let presentation = err.to_presentation();
            eprintln!("{}: {}", presentation.title, presentation.message);
            if let Some(action) = presentation.action {
                eprintln!("  → {}", action);
            }
            process::exit(1);
        }
    }
}
