//! media-organizer - Rename, move and de-duplicate movie and TV libraries
//!
//! Main entry point for the command line application.
//!
//! # Execution Flow
//!
//! 1. Parse arguments ([`Cli`])
//! 2. Initialize logging → `<log-dir>/media_organizer.log` (+ stderr unless `--quiet`)
//! 3. Create a tokio runtime for HTTP, subprocess and Ctrl-C handling
//! 4. Load `config.ini` and run the selected command
//! 5. Shutdown the runtime with a 5s timeout

use anyhow::Result;
use clap::Parser;
use media_organizer::cli::{Cli, commands};
use media_organizer::{APP_NAME, VERSION};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Held until exit so buffered log lines are flushed
    let _log_guard = media_organizer::logging::setup_logging(&cli.log_dir, cli.debug, !cli.quiet)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(4)
        .thread_name("media-organizer-worker")
        .build()?;

    let result = runtime.block_on(commands::run(cli));

    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    match &result {
        Ok(()) => tracing::info!("Application shutdown complete"),
        Err(e) => tracing::error!("{:#}", e),
    }
    result
}
