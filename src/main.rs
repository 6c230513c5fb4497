//! ration-ledger CLI entry point
//!
//! Installs logging, then hands the parsed command to `cli::run_command`.
//! Logs go to stderr; stdout carries only JSON responses.

use std::path::Path;

use ration_ledger::cli::{self, Cli, Command};
use ration_ledger::config::Config;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "ration_ledger=info";

fn main() {
    let cli = Cli::parse_args();
    init_logging(config_path(&cli.command));

    if let Err(e) = cli::run_command(cli.command) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn config_path(command: &Command) -> Option<&Path> {
    match command {
        Command::Init { config } | Command::Invoke { config } | Command::Batch { config } => {
            Some(config.as_path())
        }
        Command::Schema { config } => config.as_deref(),
    }
}

/// `RUST_LOG` wins; otherwise the configured filter, if the config loads
fn init_logging(config: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let configured = config
            .and_then(|path| Config::load(path).ok())
            .map(|c| c.log_filter)
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        EnvFilter::try_new(configured).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
