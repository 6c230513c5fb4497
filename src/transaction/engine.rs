//! Transaction engine
//!
//! Drives one invocation through a fixed sequence of states, stopping at the
//! first failure:
//!
//! `Received → CallerAuthorized → ArgumentsValidated → RoutineExecuted →
//! EventEmitted → Completed`
//!
//! The caller check happens before any argument is looked at. Writes reach
//! the ledger in one atomic commit after the routine returns; events are
//! delivered only after that commit and a delivery failure never undoes it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use super::context::{Args, TxContext};
use super::definition::{Caller, TransactionDefinition};
use crate::asset::AssetManager;
use crate::catalog::Catalog;
use crate::errors::{LedgerError, LedgerResult};
use crate::events::EventSink;
use crate::ledger::{Ledger, TxStub};
use crate::validation::{ValidationContext, Validator};

/// Invocation lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Received,
    CallerAuthorized,
    ArgumentsValidated,
    RoutineExecuted,
    EventEmitted,
    Completed,
}

impl TxState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::CallerAuthorized => "caller_authorized",
            Self::ArgumentsValidated => "arguments_validated",
            Self::RoutineExecuted => "routine_executed",
            Self::EventEmitted => "event_emitted",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for TxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request to run a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    #[serde(default = "Uuid::new_v4")]
    pub tx_id: Uuid,
    pub tx: String,
    pub caller: Caller,
    #[serde(default)]
    pub args: Map<String, JsonValue>,
    /// Invocation time; time-dependent validators read this, not the clock
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Invocation {
    pub fn new(tx: impl Into<String>, caller: Caller, args: Map<String, JsonValue>) -> Self {
        Self {
            tx_id: Uuid::new_v4(),
            tx: tx.into(),
            caller,
            args,
            timestamp: Utc::now(),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Outcome of a completed invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub tx_id: Uuid,
    pub result: JsonValue,
    /// Tags of the events the sink accepted
    pub events: Vec<String>,
}

pub struct TransactionEngine {
    catalog: Arc<Catalog>,
    ledger: Arc<dyn Ledger>,
    sink: Arc<dyn EventSink>,
}

impl TransactionEngine {
    pub fn new(catalog: Arc<Catalog>, ledger: Arc<dyn Ledger>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            catalog,
            ledger,
            sink,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn invoke(&self, invocation: &Invocation) -> LedgerResult<Receipt> {
        let span = info_span!("invoke", tx = %invocation.tx, tx_id = %invocation.tx_id);
        let _guard = span.enter();
        debug!(state = %TxState::Received);

        let definition = self.catalog.transactions.lookup(&invocation.tx)?;
        let caller = &invocation.caller;
        if !definition.allows(caller) {
            info!(org = %caller.org, role = %caller.role, "caller rejected");
            return Err(LedgerError::unauthorized(&caller.org, &caller.role, &definition.tag));
        }
        debug!(state = %TxState::CallerAuthorized);

        let vctx = ValidationContext::new(invocation.timestamp);
        let validator = Validator::new(&self.catalog.datatypes, &self.catalog.asset_types, &vctx);
        let args = validate_arguments(definition, &invocation.args, &validator).map_err(|e| {
            info!(error = %e, "arguments rejected");
            e
        })?;
        debug!(state = %TxState::ArgumentsValidated, args = args.len());

        let mut ctx = TxContext::new(
            invocation.tx_id,
            caller,
            invocation.timestamp,
            AssetManager::new(&self.catalog.asset_types, validator),
            TxStub::new(self.ledger.as_ref()),
            &self.catalog.events,
        );
        let result = (definition.routine)(&mut ctx, &args).map_err(|e| {
            info!(error = %e, "routine failed");
            e
        })?;
        debug!(state = %TxState::RoutineExecuted);

        let (write_set, events) = ctx.finish();
        self.ledger.commit(&write_set).map_err(|e| {
            info!(error = %e, "commit rejected");
            e
        })?;
        debug!(writes = write_set.writes.len(), "write set committed");

        let mut delivered = Vec::with_capacity(events.len());
        for event in events {
            let delivery = serde_json::to_vec(&event.payload)
                .map_err(std::io::Error::from)
                .and_then(|payload| self.sink.emit(&event.tag, &payload));
            match delivery {
                Ok(()) => delivered.push(event.tag),
                Err(e) => warn!(event = %event.tag, error = %e, "event delivery failed"),
            }
        }
        debug!(state = %TxState::EventEmitted, delivered = delivered.len());

        debug!(state = %TxState::Completed);
        Ok(Receipt {
            tx_id: invocation.tx_id,
            result,
            events: delivered,
        })
    }
}

/// Parses every declared argument. Undeclared arguments are ignored.
fn validate_arguments(
    definition: &TransactionDefinition,
    raw: &Map<String, JsonValue>,
    validator: &Validator<'_>,
) -> LedgerResult<Args> {
    let mut values = BTreeMap::new();
    for arg in &definition.args {
        match raw.get(&arg.tag).filter(|v| !v.is_null()) {
            Some(value) => {
                let parsed = validator
                    .parse_typed(&arg.data_type, value)
                    .map_err(|cause| LedgerError::invalid_argument(&arg.tag, cause))?;
                values.insert(arg.tag.clone(), parsed);
            }
            None if arg.required => {
                return Err(LedgerError::invalid_argument(
                    &arg.tag,
                    LedgerError::missing_required(&arg.tag),
                ));
            }
            None => {}
        }
    }
    Ok(Args::new(values))
}
