// flowsync/src/sync/partition.rs
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::model::{ActionKind, DestinationItem, RecordWithErrors, SourceRecord, SyncConfig};
use crate::sync::classify::classify;

/// The classified record set. Every input record lands in exactly one of
/// `create`, `update`, `delete`, `errors` or `skipped`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Partition {
    pub create: Vec<SourceRecord>,
    pub update: Vec<SourceRecord>,
    pub delete: Vec<SourceRecord>,
    pub errors: Vec<RecordWithErrors>,
    pub skipped: Vec<SourceRecord>,
    /// Destination items no record references; empty unless orphan deletion is on.
    pub orphans: Vec<DestinationItem>,
}

pub fn partition(sync: &SyncConfig, records: Vec<SourceRecord>, items: &[DestinationItem]) -> Partition {
    let live_ids: HashSet<&str> = items.iter().map(|item| item.id.as_str()).collect();
    let item_id_field = &sync.special.item_id.airtable.id;
    let state_field = &sync.special.state.airtable.id;

    let mut result = Partition::default();
    let mut preserved: HashSet<String> = HashSet::new();

    for record in records {
        let item_id = record.text(item_id_field);
        let state = record.text(state_field);
        let has_valid_item_id = item_id.as_deref().is_some_and(|id| live_ids.contains(id));

        let action = classify(state.as_deref(), item_id.as_deref(), has_valid_item_id);
        if action.preserve_item_id {
            if let Some(id) = item_id {
                preserved.insert(id);
            }
        }

        match action.kind {
            ActionKind::Create => result.create.push(record),
            ActionKind::Update => result.update.push(record),
            ActionKind::Delete => result.delete.push(record),
            ActionKind::Skip => result.skipped.push(record),
            ActionKind::Error(message) => result.errors.push(RecordWithErrors::new(record, message)),
        }
    }

    if sync.settings.delete_orphans {
        result.orphans = items
            .iter()
            .filter(|item| !preserved.contains(&item.id))
            .cloned()
            .collect();
    }

    debug!(
        create = result.create.len(),
        update = result.update.len(),
        delete = result.delete.len(),
        errors = result.errors.len(),
        skipped = result.skipped.len(),
        orphans = result.orphans.len(),
        "partitioned records"
    );
    result
}
