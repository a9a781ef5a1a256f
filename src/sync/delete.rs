// flowsync/src/sync/delete.rs
use async_trait::async_trait;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::model::{DestinationItem, RecordWithErrors, SourceRecord, SyncConfig};
use crate::sync::api::DestinationApi;
use crate::sync::batch::{BatchOperation, ITEM_TIERS, run_in_tiers};
use crate::sync::events::{EventEmitter, SyncPhase};

#[derive(Debug, Default)]
pub struct DeletionResult {
    /// Records whose item was removed; their status fields get cleared.
    pub deleted: Vec<SourceRecord>,
    pub failed: Vec<RecordWithErrors>,
    pub orphans_deleted: Vec<String>,
    /// Orphans have no record to carry an error, so only their ids are kept.
    pub orphans_failed: Vec<String>,
}

#[derive(Debug, Clone)]
struct DeleteTarget {
    item_id: String,
    record: Option<SourceRecord>,
}

struct DeleteItems<'a> {
    destination: &'a dyn DestinationApi,
    collection_id: &'a str,
    live: bool,
}

#[async_trait]
impl<'a> BatchOperation for DeleteItems<'a> {
    type Item = DeleteTarget;
    type Output = DeleteTarget;

    async fn apply(&self, batch: &[DeleteTarget]) -> Result<Vec<DeleteTarget>, AppError> {
        let ids: Vec<String> = batch.iter().map(|target| target.item_id.clone()).collect();
        self.destination
            .delete_items(self.collection_id, &ids, self.live)
            .await?;
        Ok(batch.to_vec())
    }
}

/// Removes the items of explicitly unsynced records, then any orphans.
pub async fn delete(
    sync: &SyncConfig,
    records: Vec<SourceRecord>,
    orphans: Vec<DestinationItem>,
    destination: &dyn DestinationApi,
    events: &EventEmitter,
) -> DeletionResult {
    let mut result = DeletionResult::default();
    if records.is_empty() && orphans.is_empty() {
        return result;
    }

    let item_id_field = &sync.special.item_id.airtable.id;
    let mut targets = Vec::with_capacity(records.len());
    for record in records {
        match record.text(item_id_field) {
            Some(item_id) => targets.push(DeleteTarget { item_id, record: Some(record) }),
            None => result
                .failed
                .push(RecordWithErrors::new(record, "Record has no Item ID to delete")),
        }
    }
    let record_count = targets.len();
    targets.extend(orphans.into_iter().map(|item| DeleteTarget { item_id: item.id, record: None }));

    let phase = SyncPhase::DeletingItems;
    events.start(phase, format!("Deleting {} items", targets.len()), targets.len());
    let op = DeleteItems {
        destination,
        collection_id: sync.webflow.collection.id.as_str(),
        live: sync.settings.publish_to_subdomain,
    };
    let outcome = run_in_tiers(&op, targets, ITEM_TIERS, &mut |n| events.advance(phase, n)).await;

    for target in outcome.succeeded {
        match target.record {
            Some(record) => result.deleted.push(record),
            None => result.orphans_deleted.push(target.item_id),
        }
    }
    for (target, message) in outcome.failed {
        match target.record {
            Some(record) => result.failed.push(RecordWithErrors::new(record, message)),
            None => result.orphans_failed.push(target.item_id),
        }
    }

    events.end(
        phase,
        format!(
            "{} deleted, {} orphans deleted",
            result.deleted.len(),
            result.orphans_deleted.len()
        ),
    );
    info!(
        records = record_count,
        deleted = result.deleted.len(),
        orphans_deleted = result.orphans_deleted.len(),
        "items deleted"
    );

    if !result.failed.is_empty() {
        events.error(format!("Failed to delete {} items", result.failed.len()), false);
    }
    if !result.orphans_failed.is_empty() {
        warn!(items = ?result.orphans_failed, "failed to delete orphaned items");
        events.error(
            format!("Failed to delete {} orphaned items", result.orphans_failed.len()),
            false,
        );
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testing::{item, record, sample_sync};
    use crate::sync::testing::FakeDestination;

    #[tokio::test]
    async fn test_deletes_records_and_orphans() {
        let sync = sample_sync();
        let destination = FakeDestination::with_items(vec![
            item("itm_1", "One", "one"),
            item("itm_2", "Two", "two"),
            item("itm_3", "Three", "three"),
        ]);
        let records = vec![record("rec1", Some("Not synced"), Some("itm_1"))];
        let orphans = vec![item("itm_3", "Three", "three")];

        let result = delete(&sync, records, orphans, &destination, &EventEmitter::silent()).await;

        assert_eq!(result.deleted.len(), 1);
        assert_eq!(result.orphans_deleted, vec!["itm_3"]);
        assert!(result.failed.is_empty());
        assert_eq!(destination.item_ids(), vec!["itm_2"]);
        // Both kinds of target share one bulk request.
        assert_eq!(destination.batch_sizes("delete"), vec![2]);
    }

    #[tokio::test]
    async fn test_failures_are_attributed_or_aggregated() {
        let sync = sample_sync();
        let destination = FakeDestination {
            failing_deletes: ["itm_1".to_string(), "itm_4".to_string()].into(),
            ..FakeDestination::with_items(vec![
                item("itm_1", "One", "one"),
                item("itm_2", "Two", "two"),
                item("itm_3", "Three", "three"),
                item("itm_4", "Four", "four"),
            ])
        };
        let records = vec![
            record("rec1", Some("Not synced"), Some("itm_1")),
            record("rec2", Some("Not synced"), Some("itm_2")),
        ];
        let orphans = vec![item("itm_3", "Three", "three"), item("itm_4", "Four", "four")];
        let (events, mut rx) = EventEmitter::channel();

        let result = delete(&sync, records, orphans, &destination, &events).await;

        assert_eq!(result.deleted.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["rec2"]);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].errors, vec!["Item itm_1 is referenced elsewhere"]);
        assert_eq!(result.orphans_deleted, vec!["itm_3"]);
        assert_eq!(result.orphans_failed, vec!["itm_4"]);

        let mut errors = 0;
        while let Ok(event) = rx.try_recv() {
            if let crate::sync::events::SyncEvent::Error { fatal, .. } = event {
                assert!(!fatal);
                errors += 1;
            }
        }
        assert_eq!(errors, 2);
    }
}
