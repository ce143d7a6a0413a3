//! Response code → operator message tables, one per action.

use super::ActionName;
use crate::model::EntityKind;

pub const MISSING_NAME: &str = "MISSING_NAME";
pub const DUPLICATE_NAME: &str = "DUPLICATE_NAME";
pub const UNKNOWN_PARENT: &str = "UNKNOWN_PARENT";
pub const INVALID_PAYLOAD: &str = "INVALID_PAYLOAD";
pub const SITE_IN_USE: &str = "PARKING_SITE_IN_USE";
pub const GROUP_IN_USE: &str = "PARKING_GROUP_IN_USE";
pub const SPOT_IN_USE: &str = "PARKING_SPOT_IN_USE";

const CREATE_CODES: &[(&str, &str)] = &[
    (MISSING_NAME, "A name is required"),
    (DUPLICATE_NAME, "An entry with this name already exists"),
    (UNKNOWN_PARENT, "The parent entry no longer exists"),
    (INVALID_PAYLOAD, "Some fields have invalid values"),
];

const UPDATE_CODES: &[(&str, &str)] = &[
    (MISSING_NAME, "A name is required"),
    (DUPLICATE_NAME, "An entry with this name already exists"),
    (INVALID_PAYLOAD, "Some fields have invalid values"),
];

const DELETE_CODES: &[(&str, &str)] = &[
    (SITE_IN_USE, "The parking site is in use and cannot be deleted"),
    (GROUP_IN_USE, "The parking group is in use and cannot be deleted"),
    (SPOT_IN_USE, "The parking spot is in use and cannot be deleted"),
];

/// The code the service uses to refuse deleting a referenced entity.
#[must_use]
pub fn in_use_code(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Site => SITE_IN_USE,
        EntityKind::Group => GROUP_IN_USE,
        EntityKind::Spot => SPOT_IN_USE,
    }
}

fn table(action: ActionName) -> &'static [(&'static str, &'static str)] {
    match action {
        ActionName::Create => CREATE_CODES,
        ActionName::Update => UPDATE_CODES,
        ActionName::Delete => DELETE_CODES,
        ActionName::List | ActionName::Get => &[],
    }
}

/// Whether `code` is a field validation failure the operator can fix in the form.
#[must_use]
pub fn is_validation_code(action: ActionName, code: &str) -> bool {
    matches!(action, ActionName::Create | ActionName::Update)
        && table(action).iter().any(|(known, _)| *known == code)
}

/// Operator-facing message for a failed action. Unknown or missing codes get
/// the generic message for the action.
#[must_use]
pub fn message_for(action: ActionName, kind: EntityKind, code: Option<&str>) -> String {
    code.and_then(|code| {
        table(action)
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, message)| (*message).to_string())
    })
    .unwrap_or_else(|| generic_message(action, kind))
}

#[must_use]
pub fn generic_message(action: ActionName, kind: EntityKind) -> String {
    let verb = match action {
        ActionName::List => "load",
        ActionName::Get => "refresh",
        ActionName::Create => "create",
        ActionName::Update => "update",
        ActionName::Delete => "delete",
    };
    format!("Failed to {verb} {}", kind.label().to_lowercase())
}
