//! The assembled set of registries a ledger runs against
//!
//! Built once at startup and shared read-only by every invocation. All
//! cross-registry references are checked before the catalog is handed out,
//! so a schema naming an unknown data type or asset type never reaches the
//! engine.

use std::path::Path;

use tracing::info;

use crate::datatype::DataTypeRegistry;
use crate::domain;
use crate::errors::LedgerResult;
use crate::events::EventRegistry;
use crate::schema::AssetTypeRegistry;
use crate::transaction::TransactionRegistry;

#[derive(Debug)]
pub struct Catalog {
    pub datatypes: DataTypeRegistry,
    pub asset_types: AssetTypeRegistry,
    pub events: EventRegistry,
    pub transactions: TransactionRegistry,
}

impl Catalog {
    /// Built-in data types plus the ration distribution domain
    pub fn standard() -> LedgerResult<Self> {
        Self::build(None)
    }

    /// Like [`Catalog::standard`], with extra asset types loaded from
    /// `schema_dir` when given.
    pub fn build(schema_dir: Option<&Path>) -> LedgerResult<Self> {
        let datatypes = DataTypeRegistry::with_builtins()?;

        let mut asset_types = AssetTypeRegistry::new();
        for schema in domain::asset_types() {
            asset_types.register(schema, &datatypes)?;
        }
        if let Some(dir) = schema_dir {
            let loaded = asset_types.load_dir(dir, &datatypes)?;
            info!(dir = %dir.display(), loaded, "asset types loaded");
        }
        asset_types.verify_references()?;

        let mut events = EventRegistry::new();
        for event in domain::events() {
            events.register(event)?;
        }

        let mut transactions = TransactionRegistry::new();
        for definition in domain::transactions() {
            transactions.register(definition)?;
        }
        transactions.verify(&datatypes, &asset_types)?;

        info!(
            datatypes = datatypes.len(),
            asset_types = asset_types.len(),
            events = events.len(),
            transactions = transactions.len(),
            "catalog ready"
        );

        Ok(Self {
            datatypes,
            asset_types,
            events,
            transactions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_standard_catalog_is_consistent() {
        let catalog = Catalog::standard().unwrap();
        for tag in ["member", "distributor", "distributionPoint", "inventory", "ration"] {
            assert!(catalog.asset_types.contains(tag), "{} missing", tag);
        }
        assert!(catalog.transactions.lookup("buyRation").is_ok());
        assert!(catalog.events.lookup("rationPurchasedLog").is_ok());
        assert_eq!(catalog.events.len(), 12);
    }

    #[test]
    fn test_schema_dir_extends_catalog() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("warehouse.json"),
            r#"{
                "tag": "warehouse",
                "label": "Warehouse",
                "properties": [
                    {"tag": "code", "label": "Code", "required": true, "isKey": true,
                     "dataType": {"kind": "dataType", "tag": "string"}},
                    {"tag": "stock", "label": "Stock",
                     "dataType": {"kind": "referenceList", "target": "ration"}}
                ]
            }"#,
        )
        .unwrap();

        let catalog = Catalog::build(Some(dir.path())).unwrap();
        assert!(catalog.asset_types.contains("warehouse"));
    }

    #[test]
    fn test_schema_dir_with_dangling_target_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("box.json"),
            r#"{
                "tag": "box",
                "label": "Box",
                "properties": [
                    {"tag": "code", "label": "Code", "required": true, "isKey": true,
                     "dataType": {"kind": "dataType", "tag": "string"}},
                    {"tag": "shelf", "label": "Shelf",
                     "dataType": {"kind": "reference", "target": "shelf"}}
                ]
            }"#,
        )
        .unwrap();

        let err = Catalog::build(Some(dir.path())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownAssetType);
    }
}
