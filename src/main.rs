//! Edge IP Selector - Main CLI Application
//!
//! Samples candidate addresses from a CDN provider's published IPv4 ranges,
//! probes each one over HTTPS, and keeps the fastest as a ranked list.

use clap::Parser;
use edge_ip_selector::{
    app::{App, RunStatus},
    cli::Cli,
    config::EnvManager,
    error::{AppError, ErrorReporter, Result},
};
use std::{error::Error, process};

#[tokio::main]
async fn main() {
    // Panics inside probe workers are recorded as aborted probes by the pool,
    // so the hook only reports and never exits
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        eprintln!("Please report this issue at: https://github.com/MaurUppi/edge-ip-selector/issues");
    }));

    // Parse command line arguments
    let cli = Cli::parse();
    let reporter = ErrorReporter::new(cli.color_override().unwrap_or(true), cli.verbose);
    let verbose = cli.verbose;

    match run_application(cli).await {
        Ok(status) => process::exit(status.exit_code()),
        Err(e) => {
            reporter.report_error(&e);

            if let Some(source) = e.source() {
                eprintln!("Caused by: {}", source);
            }

            // Print suggestions for common errors
            print_error_suggestions(&e, verbose);

            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<RunStatus> {
    let app = App::new(cli)?;
    let report = app.run().await?;
    Ok(report.status)
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError, verbose: bool) {
    match error {
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Check your .env file format");
            eprintln!("  - The ranges URL must start with https://");
            eprintln!("  - The trace host is a bare host name, without scheme or port");
            if verbose {
                eprintln!();
                eprintln!("{}", EnvManager::display_env_help());
            }
        }
        AppError::CandidateAcquisition(_) => {
            eprintln!();
            eprintln!("Candidate troubleshooting:");
            eprintln!("  - Check your internet connection to the ranges URL");
            eprintln!("  - Use --ranges-file with a saved copy of the range list");
            eprintln!("  - Or pass addresses directly with --ip");
        }
        AppError::Parse(_) => {
            eprintln!();
            eprintln!("The saved result file could not be read.");
            eprintln!("  - Run without --load to probe again and overwrite it");
        }
        _ => {}
    }
}
