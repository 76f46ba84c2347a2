//! Haulplan - oversize and heavy-haul load planning
//!
//! A CLI that plans cargo onto trucks, prices state permits along a route
//! and manages the resulting quotes.

mod cli;
mod commands;
mod output;

use clap::Parser;
use cli::Cli;

/// Log to stderr so JSON output on stdout stays clean
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("haulplan={level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = commands::execute(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
