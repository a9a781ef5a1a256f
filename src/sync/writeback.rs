// flowsync/src/sync/writeback.rs
//! Writes the outcome of a run back onto the Airtable records.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::model::{MatchedItem, RecordWithErrors, SourceRecord, SyncConfig};
use crate::sync::api::{RecordUpdate, SourceApi};
use crate::sync::batch::{BatchOperation, RECORD_TIERS, run_in_tiers};
use crate::sync::classify::{STATE_ALWAYS, STATE_STAGING};
use crate::sync::events::{EventEmitter, SyncPhase};
use crate::sync::logic::SyncContext;

/// Where each record of the run ended up.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunOutcome<'a> {
    pub created: &'a [MatchedItem],
    pub updated: &'a [MatchedItem],
    pub deleted: &'a [SourceRecord],
    pub failed: &'a [RecordWithErrors],
}

#[derive(Debug, Default)]
pub struct WritebackResult {
    pub updated: usize,
    /// (record id, message) for every record whose status could not be written.
    pub failed: Vec<(String, String)>,
}

struct UpdateRecords<'a> {
    source: &'a dyn SourceApi,
    base_id: &'a str,
    table_id: &'a str,
}

#[async_trait]
impl<'a> BatchOperation for UpdateRecords<'a> {
    type Item = RecordUpdate;
    type Output = String;

    async fn apply(&self, batch: &[RecordUpdate]) -> Result<Vec<String>, AppError> {
        self.source
            .update_records(self.base_id, self.table_id, batch)
            .await?;
        Ok(batch.iter().map(|update| update.id.clone()).collect())
    }
}

/// `Always sync` records keep syncing every run; everything else parks in
/// `Staging` until someone queues it again.
fn next_state(sync: &SyncConfig, record: &SourceRecord) -> &'static str {
    match record.text(&sync.special.state.airtable.id).as_deref() {
        Some(STATE_ALWAYS) => STATE_ALWAYS,
        _ => STATE_STAGING,
    }
}

fn synced_fields(sync: &SyncConfig, matched: &MatchedItem, synced_at: &str, with_item_id: bool) -> Map<String, Value> {
    let special = &sync.special;
    let mut fields = Map::new();
    if with_item_id {
        fields.insert(special.item_id.airtable.id.clone(), Value::String(matched.item_id.clone()));
    }
    fields.insert(special.last_published.airtable.id.clone(), Value::String(synced_at.to_string()));
    fields.insert(special.slug.airtable.id.clone(), Value::String(matched.slug.clone()));
    fields.insert(
        special.state.airtable.id.clone(),
        Value::String(next_state(sync, &matched.record).to_string()),
    );
    fields.insert(special.errors.airtable.id.clone(), Value::Null);
    fields
}

/// One update per affected record: created, updated, deleted, then failed.
pub fn build_updates(sync: &SyncConfig, outcome: RunOutcome<'_>, synced_at: DateTime<Utc>) -> Vec<RecordUpdate> {
    let RunOutcome { created, updated, deleted, failed } = outcome;
    let synced_at = synced_at.to_rfc3339_opts(SecondsFormat::Millis, true);
    let special = &sync.special;
    let mut updates = Vec::with_capacity(created.len() + updated.len() + deleted.len() + failed.len());

    updates.extend(created.iter().map(|matched| RecordUpdate {
        id: matched.record.id.clone(),
        fields: synced_fields(sync, matched, &synced_at, true),
    }));
    updates.extend(updated.iter().map(|matched| RecordUpdate {
        id: matched.record.id.clone(),
        fields: synced_fields(sync, matched, &synced_at, false),
    }));
    updates.extend(deleted.iter().map(|record| {
        let mut fields = Map::new();
        fields.insert(special.item_id.airtable.id.clone(), Value::Null);
        fields.insert(special.slug.airtable.id.clone(), Value::Null);
        fields.insert(special.last_published.airtable.id.clone(), Value::Null);
        RecordUpdate { id: record.id.clone(), fields }
    }));
    updates.extend(failed.iter().map(|failure| {
        let mut fields = Map::new();
        fields.insert(special.errors.airtable.id.clone(), Value::String(failure.errors.join("\n")));
        RecordUpdate { id: failure.record.id.clone(), fields }
    }));
    updates
}

pub async fn writeback(
    ctx: SyncContext<'_>,
    outcome: RunOutcome<'_>,
    events: &EventEmitter,
    synced_at: DateTime<Utc>,
) -> WritebackResult {
    let SyncContext { sync, source, .. } = ctx;
    let updates = build_updates(sync, outcome, synced_at);
    let mut result = WritebackResult::default();
    if updates.is_empty() {
        return result;
    }

    let phase = SyncPhase::UpdatingRecords;
    events.start(phase, format!("Updating {} Airtable records", updates.len()), updates.len());
    let op = UpdateRecords {
        source,
        base_id: sync.airtable.base.id.as_str(),
        table_id: sync.airtable.table.id.as_str(),
    };
    let outcome = run_in_tiers(&op, updates, RECORD_TIERS, &mut |n| events.advance(phase, n)).await;

    result.updated = outcome.succeeded.len();
    result.failed = outcome
        .failed
        .into_iter()
        .map(|(update, message)| (update.id, message))
        .collect();

    events.end(phase, format!("{} records updated", result.updated));
    info!(updated = result.updated, failed = result.failed.len(), "status written back");

    if !result.failed.is_empty() {
        for (id, message) in &result.failed {
            warn!(record_id = %id, error = %message, "could not write sync status");
        }
        events.error(
            format!("Failed to write sync status to {} Airtable records", result.failed.len()),
            false,
        );
    }
    result
}
