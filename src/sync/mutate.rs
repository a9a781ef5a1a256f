// flowsync/src/sync/mutate.rs
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::model::{MatchedItem, ParsedRecord, RecordWithErrors, SourceRecord, SyncConfig};
use crate::sync::api::{DestinationApi, ItemUpdate, SourceApi};
use crate::sync::batch::{BatchOperation, ITEM_TIERS, run_in_tiers};
use crate::sync::events::{EventEmitter, SyncPhase};
use crate::sync::parse::parse_record;
use crate::sync::reconcile::reconcile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
}

impl MutationKind {
    fn phase(self) -> SyncPhase {
        match self {
            MutationKind::Create => SyncPhase::CreatingItems,
            MutationKind::Update => SyncPhase::UpdatingItems,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
        }
    }
}

#[derive(Debug, Default)]
pub struct MutationResult {
    pub succeeded: Vec<MatchedItem>,
    pub failed: Vec<RecordWithErrors>,
}

/// What one sent record became once the response was reconciled.
enum Written {
    Matched(MatchedItem),
    Unmatched(SourceRecord),
}

/// Splits a reconciled batch into matched items and the records nothing in
/// the response could be paired with.
fn settle(batch: &[ParsedRecord], matched: Vec<MatchedItem>) -> Vec<Written> {
    let matched_ids: HashSet<String> = matched.iter().map(|m| m.record.id.clone()).collect();
    let mut written: Vec<Written> = matched.into_iter().map(Written::Matched).collect();
    written.extend(
        batch
            .iter()
            .filter(|parsed| !matched_ids.contains(&parsed.record.id))
            .map(|parsed| Written::Unmatched(parsed.record.clone())),
    );
    written
}

struct CreateItems<'a> {
    destination: &'a dyn DestinationApi,
    collection_id: &'a str,
    live: bool,
}

#[async_trait]
impl<'a> BatchOperation for CreateItems<'a> {
    type Item = ParsedRecord;
    type Output = Written;

    async fn apply(&self, batch: &[ParsedRecord]) -> Result<Vec<Written>, AppError> {
        let field_data: Vec<_> = batch.iter().map(|parsed| parsed.field_data.clone()).collect();
        let response = self
            .destination
            .create_items(self.collection_id, &field_data, self.live)
            .await?;
        Ok(settle(batch, reconcile(batch, response)))
    }
}

struct UpdateItems<'a> {
    destination: &'a dyn DestinationApi,
    collection_id: &'a str,
    live: bool,
}

#[async_trait]
impl<'a> BatchOperation for UpdateItems<'a> {
    type Item = ParsedRecord;
    type Output = Written;

    async fn apply(&self, batch: &[ParsedRecord]) -> Result<Vec<Written>, AppError> {
        let updates: Vec<ItemUpdate> = batch
            .iter()
            .filter_map(|parsed| {
                Some(ItemUpdate {
                    id: parsed.item_id.clone()?,
                    field_data: parsed.field_data.clone(),
                })
            })
            .collect();
        let response = self
            .destination
            .update_items(self.collection_id, &updates, self.live)
            .await?;
        Ok(settle(batch, reconcile(batch, response)))
    }
}

/// Parses `records` and writes them to the collection, backing off through
/// smaller batches until every record has either been written or failed on
/// its own.
pub async fn mutate(
    kind: MutationKind,
    sync: &SyncConfig,
    records: Vec<SourceRecord>,
    source: &dyn SourceApi,
    destination: &dyn DestinationApi,
    events: &EventEmitter,
) -> MutationResult {
    let mut result = MutationResult::default();
    if records.is_empty() {
        return result;
    }

    events.spinner(SyncPhase::ParsingData, format!("Parsing {} records to {}", records.len(), kind.verb()));
    let item_id_field = &sync.special.item_id.airtable.id;
    let mut parsed = Vec::with_capacity(records.len());
    for record in &records {
        let item_id = match kind {
            MutationKind::Create => None,
            MutationKind::Update => match record.text(item_id_field) {
                Some(id) => Some(id),
                None => {
                    result
                        .failed
                        .push(RecordWithErrors::new(record.clone(), "Record has no Item ID to update"));
                    continue;
                }
            },
        };
        match parse_record(record, sync, source, item_id).await {
            Ok(record) => parsed.push(record),
            Err(failed) => result.failed.push(failed),
        }
    }

    let phase = kind.phase();
    let total = parsed.len();
    events.start(phase, format!("Sending {} items to {}", total, kind.verb()), total);

    let collection_id = sync.webflow.collection.id.as_str();
    let live = sync.settings.publish_to_subdomain;
    let mut on_settled = |n: usize| events.advance(phase, n);
    let outcome = match kind {
        MutationKind::Create => {
            let op = CreateItems { destination, collection_id, live };
            run_in_tiers(&op, parsed, ITEM_TIERS, &mut on_settled).await
        }
        MutationKind::Update => {
            let op = UpdateItems { destination, collection_id, live };
            run_in_tiers(&op, parsed, ITEM_TIERS, &mut on_settled).await
        }
    };

    let mut unmatched = Vec::new();
    for written in outcome.succeeded {
        match written {
            Written::Matched(item) => result.succeeded.push(item),
            Written::Unmatched(record) => unmatched.push(record.id),
        }
    }
    result.failed.extend(
        outcome
            .failed
            .into_iter()
            .map(|(parsed, message)| RecordWithErrors::new(parsed.record, message)),
    );

    events.end(phase, format!("{} {}d, {} failed", result.succeeded.len(), kind.verb(), result.failed.len()));
    info!(
        operation = kind.verb(),
        succeeded = result.succeeded.len(),
        failed = result.failed.len(),
        "items written"
    );

    if !unmatched.is_empty() {
        warn!(records = ?unmatched, "records were written but could not be matched in the response");
        events.error(
            format!(
                "{} records were sent to Webflow but could not be matched to a returned item; their status was not written back",
                unmatched.len()
            ),
            false,
        );
    }
    if !result.failed.is_empty() {
        events.error(format!("Failed to {} {} items", kind.verb(), result.failed.len()), false);
    }

    result
}
