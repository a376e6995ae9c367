mod logging;
mod run;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use dilution_logging::{dilution_error, dilution_info};
use log::LevelFilter;

use logging::LogDestination;

/// Measure how system-prompt adherence degrades as user input grows.
#[derive(Debug, Parser)]
#[command(name = "dilution", version)]
struct Cli {
    /// RON file overriding the built-in experiment configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Mirror log output to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Log at debug level: per-trial token breakdown and each model call.
    #[arg(short, long)]
    verbose: bool,
    /// Print the default configuration as RON and exit.
    #[arg(long)]
    print_config: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.print_config {
        return match settings::render_default() {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("Failed to render default config: {err}");
                ExitCode::FAILURE
            }
        };
    }

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let destination = match cli.log_file {
        Some(path) => LogDestination::Both(path),
        None => LogDestination::Terminal,
    };
    logging::initialize(destination, level);

    let api_key = std::env::var(run::API_KEY_VAR).ok();
    match run::run(cli.config.as_deref(), api_key) {
        Ok(report) => {
            dilution_info!(
                "Completed {} trials ({} lengths skipped); results at {}",
                report.records.len(),
                report.skipped_lengths.len(),
                report.results_path.display()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            dilution_error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
