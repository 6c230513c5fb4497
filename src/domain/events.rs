use super::{ORG_INVENTORY, ORG_MEMBERS, ORG_PLATFORM, ORG_RATIONS};
use crate::events::EventType;

pub fn events() -> Vec<EventType> {
    let members = &[ORG_MEMBERS, ORG_PLATFORM];
    let rations = &[ORG_RATIONS, ORG_PLATFORM];

    vec![
        EventType::new(
            "distributionPointCreatedLog",
            "Distribution Point Created Log",
            "Log of distribution point creation",
            "New distribution point created",
            members,
        ),
        EventType::new(
            "distributorCreatedLog",
            "Distributor Created Log",
            "Log of distributor creation",
            "New distributor created",
            members,
        ),
        EventType::new(
            "inventoryCreatedLog",
            "Inventory Created Log",
            "Log of inventory creation",
            "New inventory created",
            &[ORG_INVENTORY, ORG_PLATFORM],
        ),
        EventType::new(
            "inventoryReplenishedLog",
            "Inventory Replenished Log",
            "Log of rations added to a distribution point inventory",
            "Inventory replenished",
            members,
        ),
        EventType::new(
            "memberInfoUpdatedLog",
            "Member Info Updated Log",
            "Log of member information update",
            "Member information updated",
            members,
        ),
        EventType::new(
            "pickupScheduleGetLog",
            "Pickup Schedule Get Log",
            "Log of getting the pickup schedule",
            "Pickup schedule retrieved",
            members,
        ),
        EventType::new(
            "pickupScheduleSetLog",
            "Pickup Schedule Set Log",
            "Log of setting the pickup schedule",
            "Pickup schedule set",
            members,
        ),
        EventType::new(
            "rationCardIssuedLog",
            "Ration Card Issued Log",
            "Log of a ration card issuance",
            "New ration card issued",
            members,
        ),
        EventType::new(
            "rationCreatedLog",
            "Ration Created Log",
            "Log of ration creation",
            "New ration created",
            rations,
        ),
        EventType::new(
            "rationDeletedLog",
            "Ration Deleted Log",
            "Log of ration deletion",
            "Ration deleted",
            rations,
        ),
        EventType::new(
            "rationPurchasedLog",
            "Ration Purchased Log",
            "Log of ration purchase",
            "Ration purchased",
            members,
        ),
        EventType::new(
            "rationUpdatedLog",
            "Ration Updated Log",
            "Log of ration update",
            "Ration updated",
            rations,
        ),
    ]
}
