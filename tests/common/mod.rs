//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Map, Value};

use ration_ledger::events::MemoryEventSink;
use ration_ledger::ledger::{Ledger, MemoryLedger};
use ration_ledger::{Caller, Catalog, Invocation, LedgerResult, Receipt, TransactionEngine};

pub const MEMBERS: &str = "org1MSP";
pub const RATIONS: &str = "org2MSP";
pub const INVENTORY: &str = "org3MSP";
pub const PLATFORM: &str = "orgMSP";

/// Fixed invocation time so time-dependent validators are reproducible
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
}

pub struct Harness {
    pub engine: TransactionEngine,
    pub ledger: Arc<MemoryLedger>,
    pub sink: Arc<MemoryEventSink>,
}

impl Harness {
    pub fn new() -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        let sink = Arc::new(MemoryEventSink::new());
        let engine = TransactionEngine::new(
            Arc::new(Catalog::standard().unwrap()),
            ledger.clone() as Arc<dyn Ledger>,
            sink.clone(),
        );
        Self {
            engine,
            ledger,
            sink,
        }
    }

    pub fn invoke(&self, tx: &str, org: &str, role: &str, args: Value) -> LedgerResult<Receipt> {
        let args: Map<String, Value> = args.as_object().cloned().unwrap_or_default();
        let invocation = Invocation::new(tx, Caller::new(org, role), args).at(now());
        self.engine.invoke(&invocation)
    }

    pub fn admin(&self, tx: &str, org: &str, args: Value) -> LedgerResult<Receipt> {
        self.invoke(tx, org, "admin", args)
    }

    pub fn seed_distributor(&self, id: &str) {
        self.admin(
            "createDistributor",
            MEMBERS,
            json!({"distributorId": id, "name": "North Depot", "licenseNumber": "DCLN-123456789"}),
        )
        .unwrap();
    }

    pub fn seed_ration(&self, id: &str, distributor: &str, quantity: i64) {
        self.admin("createRation", RATIONS, ration_args(id, distributor, quantity))
            .unwrap();
    }

    pub fn seed_member(&self, nid: &str) {
        self.admin(
            "createAsset",
            MEMBERS,
            json!({"asset": {"@assetType": "member", "nid": nid, "name": "Rahima Begum"}}),
        )
        .unwrap();
    }

    pub fn issue_card(&self, nid: &str, number: &str, status: &str) {
        self.admin(
            "issueRationCard",
            INVENTORY,
            json!({
                "nid": nid,
                "rationCardNumber": number,
                "rationCardStatus": status,
                "rationCardIssuedDate": "2024-01-01T00:00:00Z",
                "rationCardExpiryDate": "2025-01-01T00:00:00Z",
                "rationCardCategory": 2
            }),
        )
        .unwrap();
    }
}

pub fn ration_args(id: &str, distributor: &str, quantity: i64) -> Value {
    json!({
        "id": id,
        "category": 0,
        "distributedBy": distributor,
        "quantity": quantity,
        "expiryDate": "2024-06-01T00:00:00Z",
        "mfgDate": "2024-05-01T00:00:00Z",
        "batchNumber": 7
    })
}
