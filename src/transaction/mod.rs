//! Transactions
//!
//! A transaction is a named, caller-restricted routine with a typed argument
//! schema. The engine authorizes the caller, validates arguments, runs the
//! routine against a staged view of the ledger, commits, then delivers events.

mod context;
mod definition;
mod engine;

pub use context::{Args, PendingEvent, TxContext};
pub use definition::{
    ArgumentSchema, Caller, CallerPattern, Routine, TransactionDefinition, TransactionRegistry,
};
pub use engine::{Invocation, Receipt, TransactionEngine, TxState};
