//! CLI command implementations
//!
//! `invoke` and `batch` answer every request with a JSON line on stdout. A
//! rejected invocation is an ordinary error response; only failures to load
//! configuration, open the ledger or talk to stdin/stdout end the process
//! with an error.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::events::FileEventSink;
use crate::ledger::FileLedger;
use crate::transaction::{Invocation, TransactionEngine};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, read_requests, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Invoke { config } => invoke(&config),
        Command::Batch { config } => batch(&config),
        Command::Schema { config } => schema(config.as_deref()),
    }
}

/// Create the data directory with an empty ledger and event log
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;

    if is_initialized(&config) {
        return Err(CliError::already_initialized());
    }

    let data_dir = config.data_path();
    fs::create_dir_all(data_dir).map_err(|e| {
        CliError::config_error(format!("Failed to create directory {:?}: {}", data_dir, e))
    })?;
    FileLedger::open(config.ledger_path())?;
    FileEventSink::open(config.event_path())?;
    info!(data_dir = %data_dir.display(), "data directory initialized");

    write_response(json!({
        "initialized": true,
        "ledger": config.ledger_path().display().to_string(),
        "events": config.event_path().display().to_string(),
    }))
}

/// Run the single invocation read from stdin
pub fn invoke(config_path: &Path) -> CliResult<()> {
    let engine = open_engine(&Config::load(config_path)?)?;
    let request = read_request()?;
    respond(handle_request(&engine, request))
}

/// Run one invocation per stdin line, in order, until end of input
pub fn batch(config_path: &Path) -> CliResult<()> {
    let engine = open_engine(&Config::load(config_path)?)?;

    let mut handled = 0usize;
    for request in read_requests(io::stdin().lock()) {
        let outcome = match request {
            Ok(request) => handle_request(&engine, request),
            Err(e) => {
                warn!(error = %e, "unreadable request line");
                Err(e)
            }
        };
        respond(outcome)?;
        handled += 1;
    }
    info!(handled, "batch finished");
    Ok(())
}

/// Print the catalog the engine would run against
pub fn schema(config_path: Option<&Path>) -> CliResult<()> {
    let catalog = match config_path {
        Some(path) => {
            let config = Config::load(path)?;
            Catalog::build(config.schema_path())?
        }
        None => Catalog::standard()?,
    };
    write_response(describe(&catalog))
}

/// Runs one decoded request. Rejections come back as `Err`, never panic.
pub fn handle_request(engine: &TransactionEngine, request: Value) -> CliResult<Value> {
    let invocation: Invocation = serde_json::from_value(request)
        .map_err(|e| CliError::bad_request(format!("Invalid invocation: {}", e)))?;
    let receipt = engine.invoke(&invocation)?;
    Ok(serde_json::to_value(receipt)?)
}

/// JSON description of every registry in the catalog
pub fn describe(catalog: &Catalog) -> Value {
    json!({
        "dataTypes": catalog.datatypes.iter().collect::<Vec<_>>(),
        "assetTypes": catalog.asset_types.iter().collect::<Vec<_>>(),
        "transactions": catalog.transactions.iter().collect::<Vec<_>>(),
        "events": catalog.events.iter().collect::<Vec<_>>(),
    })
}

fn respond(outcome: CliResult<Value>) -> CliResult<()> {
    match outcome {
        Ok(data) => write_response(data),
        Err(e) => write_error(e.code_str(), e.message()),
    }
}

fn is_initialized(config: &Config) -> bool {
    config.ledger_path().exists()
}

fn open_engine(config: &Config) -> CliResult<TransactionEngine> {
    if !is_initialized(config) {
        return Err(CliError::not_initialized());
    }

    let catalog = Catalog::build(config.schema_path())?;
    let ledger = FileLedger::open(config.ledger_path())?;
    let sink = FileEventSink::open(config.event_path())?;

    Ok(TransactionEngine::new(
        Arc::new(catalog),
        Arc::new(ledger),
        Arc::new(sink),
    ))
}
