//! Asset type schemas
//!
//! Describes the properties of each asset type, their data types, writer
//! ACLs and key structure, and derives ledger keys from key properties.

mod registry;
mod types;

pub use registry::AssetTypeRegistry;
pub use types::{
    asset_type_of_key, AssetTypeSchema, PropertySchema, PropertyType, PropertyValidator,
    KEY_SEPARATOR,
};
