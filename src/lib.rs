//! ration-ledger - a schema-driven, permissioned record engine
//!
//! Typed asset schemas, a data type registry with canonicalizing parsers, a
//! per-property writer ACL and a transaction engine that validates, runs and
//! atomically commits each invocation against a versioned ledger.

pub mod asset;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod datatype;
pub mod domain;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod schema;
pub mod transaction;
pub mod validation;
pub mod value;

pub use catalog::Catalog;
pub use errors::{ErrorKind, LedgerError, LedgerResult};
pub use transaction::{Caller, Invocation, Receipt, TransactionEngine};
