// theoraq-cli/src/main.rs
//
// Entry point of the `theoraq` binary.
//
// Responsibilities include:
// - Parsing command-line arguments with clap.
// - Setting up console logging, or file logging when a log directory is given.
// - Dispatching to the encode or probe command.
// - Mapping results to exit codes: 0 only when every queued job succeeded.

use std::process::ExitCode;

use clap::Parser;
use console::style;
use log::error;
use theoraq_cli::logging::{init_console_logging, init_file_logging};
use theoraq_cli::{Cli, CliResult, Commands, run_encode, run_probe};

fn setup_logging(cli: &Cli) -> CliResult<()> {
    if let Commands::Encode(args) = &cli.command {
        if let Some(log_dir) = &args.log_dir {
            let log_file = init_file_logging(log_dir, cli.verbose)?;
            eprintln!("Logging to {}", log_file.display());
            return Ok(());
        }
    }
    init_console_logging(cli.verbose);
    Ok(())
}

fn run(cli: Cli) -> CliResult<bool> {
    setup_logging(&cli)?;
    match cli.command {
        Commands::Encode(args) => Ok(run_encode(args)?.all_succeeded()),
        Commands::Probe(args) => run_probe(args).map(|_| true),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
