//! Verso CLI Binary
//!
//! Command-line interface for single-file version tracking.

use clap::Parser;
use std::io::Write;
use std::process;
use tracing::{error, info};
use verso::cli::{load_config, map_error, Cli, RunContext};
use verso::logging::init_logging;

fn main() {
    let cli = Cli::parse();

    // Configuration drives logging, so it is loaded before anything else
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(Some(&config.logging)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Verso CLI starting");

    // A malformed log aborts here: nothing runs against a partial history
    let mut context = match RunContext::new(config) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error loading version log: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(&output.stdout).and_then(|_| stdout.flush()) {
                error!("Failed to write output: {}", e);
                process::exit(1);
            }
            process::exit(output.exit_code);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    }
}
