//! relgraph Command-Line Inspector
//!
//! Loads a catalog document and reports entity relations, composition
//! parents, child parts and diagnostics.

mod commands;
mod config;
mod formatter;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::Args;

/// Exit code when `check` finds diagnostics.
const EXIT_DIAGNOSTICS: i32 = 2;

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("relgraph=info")),
        )
        .init();

    let args = Args::parse();

    match commands::run(&args) {
        Ok(report) => {
            println!("{}", report.output);
            if report.diagnostics > 0 {
                std::process::exit(EXIT_DIAGNOSTICS);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
