//! Member registration and ration cards

use serde_json::{json, Value as JsonValue};

use super::{admins_of, arg, key_arg};
use crate::domain::{ORG_INVENTORY, ORG_MEMBERS};
use crate::errors::{ErrorKind, LedgerError, LedgerResult};
use crate::ledger::Selector;
use crate::transaction::{Args, TransactionDefinition, TxContext};

const CARD_FIELDS: &[&str] = &[
    "rationCardNumber",
    "rationCardStatus",
    "rationCardIssuedDate",
    "rationCardExpiryDate",
    "rationCardCategory",
];

const MEMBER_FIELDS: &[&str] = &[
    "name",
    "dateOfBirth",
    "height",
    "address",
    "contactInformation",
    "familySize",
    "income",
    "disabilityStatus",
    "rationCardNumber",
    "rationCardStatus",
    "rationCardIssuedDate",
    "rationCardExpiryDate",
    "rationCardCategory",
];

pub(super) fn transactions() -> Vec<TransactionDefinition> {
    vec![
        admins_of(
            TransactionDefinition::new("issueRationCard", "Issue Ration Card", "POST", issue_ration_card)
                .description("Issue a ration card to a registered member")
                .arg(arg("nid", "National ID", "nid").required())
                .arg(arg("rationCardNumber", "Ration Card Number", "string").required())
                .arg(arg("rationCardStatus", "Ration Card Status", "rationCardStatus").required())
                .arg(arg("rationCardIssuedDate", "Ration Card Issued Date", "datetime").required())
                .arg(arg("rationCardExpiryDate", "Ration Card Expiry Date", "datetime").required())
                .arg(arg("rationCardCategory", "Ration Card Category", "rationCardCategory").required()),
            ORG_INVENTORY,
        ),
        admins_of(
            TransactionDefinition::new("updateMemberInfo", "Update Member Info", "PUT", update_member_info)
                .description("Update the given fields of a member")
                .arg(arg("nid", "National ID", "nid").required())
                .arg(arg("name", "Name", "string"))
                .arg(arg("dateOfBirth", "Date of Birth", "datetime"))
                .arg(arg("height", "Height", "number"))
                .arg(arg("address", "Address", "address"))
                .arg(arg("contactInformation", "Contact Information", "contactInfo"))
                .arg(arg("familySize", "Family Size", "integer"))
                .arg(arg("income", "Income", "integer"))
                .arg(arg("disabilityStatus", "Disability Status", "boolean"))
                .arg(arg("rationCardNumber", "Ration Card Number", "string"))
                .arg(arg("rationCardStatus", "Ration Card Status", "rationCardStatus"))
                .arg(arg("rationCardIssuedDate", "Ration Card Issued Date", "datetime"))
                .arg(arg("rationCardExpiryDate", "Ration Card Expiry Date", "datetime"))
                .arg(arg("rationCardCategory", "Ration Card Category", "rationCardCategory")),
            ORG_MEMBERS,
        ),
    ]
}

fn issue_ration_card(ctx: &mut TxContext<'_>, args: &Args) -> LedgerResult<JsonValue> {
    let nid = args.str("nid")?;
    let key = key_arg(ctx, args, "member", "nid")?;
    let member = ctx.get(&key)?;
    if member.contains("rationCardNumber") {
        return Err(LedgerError::new(
            ErrorKind::AlreadyExists,
            "ration card already issued for this member",
        )
        .with_tag("rationCardNumber"));
    }

    let issued = args.value("rationCardIssuedDate")?.as_timestamp();
    let expires = args.value("rationCardExpiryDate")?.as_timestamp();
    if expires <= issued {
        return Err(LedgerError::invalid_argument(
            "rationCardExpiryDate",
            LedgerError::invalid_value("expiry date must be after the issue date"),
        ));
    }

    let number = args.str("rationCardNumber")?;
    let holders = ctx.search(
        &Selector::asset_type("member").with("rationCardNumber", JsonValue::String(number.to_string())),
    )?;
    if !holders.is_empty() {
        return Err(LedgerError::new(
            ErrorKind::AlreadyExists,
            format!("ration card '{}' is held by another member", number),
        )
        .with_tag("rationCardNumber"));
    }

    let updated = ctx.update(&key, &args.to_props(CARD_FIELDS))?;
    ctx.emit(
        "rationCardIssuedLog",
        json!({
            "key": updated.key(),
            "message": format!("Ration card issued for member with NID: {}", nid),
        }),
    )?;
    Ok(updated.to_json())
}

fn update_member_info(ctx: &mut TxContext<'_>, args: &Args) -> LedgerResult<JsonValue> {
    let nid = args.str("nid")?;
    let key = key_arg(ctx, args, "member", "nid")?;

    let updated = ctx.update(&key, &args.to_props(MEMBER_FIELDS))?;
    ctx.emit(
        "memberInfoUpdatedLog",
        json!({
            "key": updated.key(),
            "message": format!("Member information updated for NID: {}", nid),
        }),
    )?;
    Ok(updated.to_json())
}
