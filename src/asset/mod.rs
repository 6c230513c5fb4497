//! Asset instances and their lifecycle on the ledger

mod instance;
mod manager;

pub use instance::{AssetInstance, ASSET_TYPE_FIELD, KEY_FIELD};
pub use manager::AssetManager;
