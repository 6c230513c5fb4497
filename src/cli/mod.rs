//! Command-line interface
//!
//! - init: create the data directory, ledger and event log
//! - invoke: run one invocation from stdin
//! - batch: run one invocation per stdin line
//! - schema: print the registered catalog

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{batch, describe, handle_request, init, invoke, run, run_command, schema};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, read_requests, write_error, write_response};
