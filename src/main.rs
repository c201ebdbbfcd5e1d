//! Command-line interface for seekcheck
//!
//! ```bash
//! # Check the mimetype entry of an EPUB
//! seekcheck book.epub
//!
//! # Check another entry, including the concurrency suite, as JSON
//! seekcheck archive.zip --entry data/blob.bin --concurrent --workers 8 --format json
//! ```

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use seekcheck::config::{DEFAULT_ITERATIONS_PER_WORKER, DEFAULT_READS_PER_ITEM, DEFAULT_WORKERS};
use seekcheck::types::DEFAULT_CHUNK_SIZE;
use seekcheck::{run_container, Format, HarnessConfig, DEFAULT_ENTRY_NAME};

#[derive(Parser)]
#[command(name = "seekcheck")]
#[command(about = "Verify seek and read behavior of an entry inside a ZIP container")]
#[command(version)]
struct Cli {
    /// Path of the container to open
    path: PathBuf,

    /// Entry to check inside the container
    #[arg(long, env = "SEEKCHECK_ENTRY", default_value = DEFAULT_ENTRY_NAME)]
    entry: String,

    /// Worker threads for the concurrency suite
    #[arg(long, env = "SEEKCHECK_WORKERS", default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Bytes per read in chunked and concurrent reads
    #[arg(long, env = "SEEKCHECK_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Also run the concurrency suite
    #[arg(long)]
    concurrent: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Log debug output unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> HarnessConfig {
        HarnessConfig {
            chunk_size: self.chunk_size,
            workers: self.workers,
            iterations_per_worker: DEFAULT_ITERATIONS_PER_WORKER,
            reads_per_item: DEFAULT_READS_PER_ITEM,
            concurrent: self.concurrent,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Unlocked handles: workers log to stderr while the run is in progress.
    match run_container(&cli.path, &cli.entry, &cli.config(), cli.format, io::stdout(), io::stderr()) {
        Ok(report) if report.passed() => ExitCode::SUCCESS,
        Ok(report) => {
            eprintln!("Error: {} of {} checks failed", report.failures(), report.checks());
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            for line in e.backtrace().lines().skip(1) {
                eprintln!("  {}", line);
            }
            ExitCode::FAILURE
        }
    }
}
