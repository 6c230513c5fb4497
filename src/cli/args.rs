//! CLI argument definitions using clap
//!
//! Commands:
//! - ration-ledger init --config <path>
//! - ration-ledger invoke --config <path>
//! - ration-ledger batch --config <path>
//! - ration-ledger schema [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Schema-driven, permissioned ledger for ration distribution
#[derive(Parser, Debug)]
#[command(name = "ration-ledger")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the data directory, ledger file and event log
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./ration-ledger.json")]
        config: PathBuf,
    },

    /// Run one invocation read from stdin and exit
    Invoke {
        /// Path to configuration file
        #[arg(long, default_value = "./ration-ledger.json")]
        config: PathBuf,
    },

    /// Run one invocation per stdin line until end of input
    Batch {
        /// Path to configuration file
        #[arg(long, default_value = "./ration-ledger.json")]
        config: PathBuf,
    },

    /// Print every registered data type, asset type, transaction and event
    Schema {
        /// Include asset types from the configured schema directory
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
