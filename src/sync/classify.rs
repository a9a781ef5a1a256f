// flowsync/src/sync/classify.rs
use crate::model::{ActionKind, RecordAction};

pub const STATE_STAGING: &str = "Staging";
pub const STATE_NOT_SYNCED: &str = "Not synced";
pub const STATE_QUEUED: &str = "Queued for sync";
pub const STATE_ALWAYS: &str = "Always sync";

pub const DANGLING_ITEM_ID: &str = "Record contained an Item ID not found in Webflow. Clear the Item ID field or restore the item in Webflow.";

/// Decides what a record needs this run from its state flag and item id.
///
/// `has_valid_item_id` is true only when the record's item id names a live
/// destination item. Total over all inputs.
pub fn classify(state: Option<&str>, item_id: Option<&str>, has_valid_item_id: bool) -> RecordAction {
    let has_item_id = item_id.is_some_and(|id| !id.trim().is_empty());
    let dangling = || RecordAction::new(ActionKind::Error(DANGLING_ITEM_ID.to_string()), true);

    match state.unwrap_or_default() {
        STATE_STAGING => RecordAction::new(ActionKind::Skip, has_item_id),
        STATE_NOT_SYNCED => match (has_item_id, has_valid_item_id) {
            (false, _) => RecordAction::new(ActionKind::Skip, false),
            (true, true) => RecordAction::new(ActionKind::Delete, true),
            (true, false) => dangling(),
        },
        STATE_QUEUED | STATE_ALWAYS => match (has_item_id, has_valid_item_id) {
            (false, _) => RecordAction::new(ActionKind::Create, false),
            (true, true) => RecordAction::new(ActionKind::Update, true),
            (true, false) => dangling(),
        },
        other => RecordAction::new(
            ActionKind::Error(format!(
                "State field value \"{}\" didn't match any expected values.",
                other
            )),
            has_item_id,
        ),
    }
}
