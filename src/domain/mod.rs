//! The ration distribution network: its asset types, events and transactions

mod assets;
mod events;
mod transactions;

pub use assets::{asset_types, license_number_checks};
pub use events::events;
pub use transactions::transactions;

/// Member registration office
pub const ORG_MEMBERS: &str = "org1MSP";
/// Ration producers
pub const ORG_RATIONS: &str = "org2MSP";
/// Inventory and card issuing office
pub const ORG_INVENTORY: &str = "org3MSP";
/// Platform operator, admitted everywhere
pub const ORG_PLATFORM: &str = "orgMSP";

pub const ROLE_ADMIN: &str = "admin";
