//! Schema-aware SQL template sanitizer.
//!
//! Prints the sanitized query on stdout. A rejected query or parameter exits
//! with status 1; configuration, cache and connection failures exit with 2.
//!
//! # Security Guarantees
//! - Values are substituted only after passing their column type validator
//! - Live introspection uses read-only sessions
//! - Credentials are never logged

use clap::Parser;
use sqlguard::commands::{self, is_rejection};
use sqlguard::{Cli, Command};
use sqlguard_core::logging::init_logging;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.global.verbose, cli.global.quiet) {
        eprintln!("Error: {e}");
        return ExitCode::from(2);
    }

    let mut stdout = std::io::stdout().lock();
    let result = match &cli.command {
        Command::Sanitize(args) => commands::sanitize(&cli.global, args, &mut stdout).await,
        Command::Schema { action } => commands::schema(&cli.global, action, &mut stdout).await,
        Command::Decode(args) => commands::decode(args, &mut stdout),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_rejection(&e) => {
            eprintln!("Rejected: {e}");
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}
