//! Asset type registry
//!
//! Holds every asset type schema, keyed by tag. Built-in types are registered
//! in code; extra types may be loaded from a directory of JSON definitions at
//! start-up. Registration is write-once: a tag can never be redefined.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::info;

use super::types::{AssetTypeSchema, PropertyType};
use crate::datatype::DataTypeRegistry;
use crate::errors::{ErrorKind, LedgerError, LedgerResult};

#[derive(Debug, Clone, Default)]
pub struct AssetTypeRegistry {
    types: BTreeMap<String, AssetTypeSchema>,
}

impl AssetTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an asset type after checking its structure and data types.
    ///
    /// Reference targets are checked separately by [`verify_references`],
    /// since asset types may point at each other.
    ///
    /// [`verify_references`]: AssetTypeRegistry::verify_references
    pub fn register(
        &mut self,
        schema: AssetTypeSchema,
        datatypes: &DataTypeRegistry,
    ) -> LedgerResult<()> {
        schema
            .validate_structure()
            .map_err(|e| LedgerError::malformed_schema(schema.tag.clone(), e))?;

        for property in &schema.properties {
            if let PropertyType::DataType { tag } = &property.data_type {
                datatypes
                    .lookup(tag)
                    .map_err(|e| e.with_tag(property.tag.clone()))?;
            }
        }

        if self.types.contains_key(&schema.tag) {
            return Err(LedgerError::new(
                ErrorKind::AlreadyExists,
                format!("asset type '{}' is already registered", schema.tag),
            ));
        }

        self.types.insert(schema.tag.clone(), schema);
        Ok(())
    }

    /// Checks that every reference property points at a registered type
    pub fn verify_references(&self) -> LedgerResult<()> {
        for schema in self.types.values() {
            for property in &schema.properties {
                if let Some(target) = property.data_type.reference_target() {
                    if !self.types.contains_key(target) {
                        return Err(LedgerError::unknown_asset_type(target)
                            .with_tag(format!("{}.{}", schema.tag, property.tag)));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn lookup(&self, tag: &str) -> LedgerResult<&AssetTypeSchema> {
        self.types
            .get(tag)
            .ok_or_else(|| LedgerError::unknown_asset_type(tag))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.types.contains_key(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetTypeSchema> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Loads every `*.json` asset type definition in `dir`.
    ///
    /// Files are read in name order so failures are reproducible. Returns the
    /// number of asset types registered.
    pub fn load_dir(&mut self, dir: &Path, datatypes: &DataTypeRegistry) -> LedgerResult<usize> {
        let entries = fs::read_dir(dir).map_err(|e| {
            LedgerError::malformed_schema(
                dir.display().to_string(),
                format!("Failed to read schema directory: {}", e),
            )
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| {
                    LedgerError::malformed_schema(
                        dir.display().to_string(),
                        format!("Failed to read directory entry: {}", e),
                    )
                })?
                .path();
            if path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            self.load_file(path, datatypes)?;
        }
        Ok(paths.len())
    }

    fn load_file(&mut self, path: &Path, datatypes: &DataTypeRegistry) -> LedgerResult<()> {
        let content = fs::read_to_string(path).map_err(|e| {
            LedgerError::malformed_schema(
                path.display().to_string(),
                format!("Failed to read file: {}", e),
            )
        })?;

        let schema: AssetTypeSchema = serde_json::from_str(&content).map_err(|e| {
            LedgerError::malformed_schema(path.display().to_string(), format!("Invalid JSON: {}", e))
        })?;

        info!(asset_type = %schema.tag, path = %path.display(), "loading asset type");
        self.register(schema, datatypes)
    }
}
