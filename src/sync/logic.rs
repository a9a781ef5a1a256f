// flowsync/src/sync/logic.rs
use chrono::Utc;
use std::time::Instant;
use tracing::info;

use crate::errors::Result;
use crate::model::SyncConfig;
use crate::sync::api::{DestinationApi, SourceApi};
use crate::sync::delete::delete;
use crate::sync::events::{CompletionEvent, EventEmitter, SyncPhase, SyncSummary, VerboseLogs};
use crate::sync::mutate::{MutationKind, mutate};
use crate::sync::partition::{Partition, partition};
use crate::sync::writeback::{RunOutcome, writeback};

/// Everything one run needs, passed down explicitly.
#[derive(Clone, Copy)]
pub struct SyncContext<'a> {
    pub sync: &'a SyncConfig,
    pub source: &'a dyn SourceApi,
    pub destination: &'a dyn DestinationApi,
}

/// Runs one sync end to end.
///
/// Stages run one after another: fetch, partition, create, update, delete,
/// write back. Only a failed fetch is fatal; record level failures end up in
/// `summary.failed` and in the error field of the record.
pub async fn run_sync(ctx: SyncContext<'_>, events: &EventEmitter) -> Result<SyncSummary> {
    let started = Instant::now();
    let SyncContext { sync, source, destination } = ctx;

    events.spinner(SyncPhase::FetchingData, "Fetching Airtable records and Webflow items");
    let fetched = tokio::try_join!(
        source.list_records(
            &sync.airtable.base.id,
            &sync.airtable.table.id,
            sync.airtable.view.as_ref().map(|view| view.id.as_str()),
        ),
        destination.list_items(&sync.webflow.collection.id),
    );
    let (records, items) = match fetched {
        Ok(fetched) => fetched,
        Err(e) => {
            events.error(format!("Failed to fetch data: {}", e), true);
            return Err(e);
        }
    };
    events.end(
        SyncPhase::FetchingData,
        format!("Fetched {} records and {} items", records.len(), items.len()),
    );
    info!(sync = %sync.name, records = records.len(), items = items.len(), "fetched data");

    let mut logs = sync.settings.verbose_logs.then(|| VerboseLogs {
        source_records: records.clone(),
        destination_items: items.clone(),
        ..VerboseLogs::default()
    });

    let partitioned = partition(sync, records, &items);
    if let Some(logs) = logs.as_mut() {
        logs.partition = Some(partitioned.clone());
    }
    let Partition {
        create,
        update,
        delete: to_delete,
        errors,
        skipped,
        orphans,
    } = partitioned;
    info!(skipped = skipped.len(), "records left as they are");
    if !errors.is_empty() {
        events.error(format!("{} records could not be synced", errors.len()), false);
    }

    let created = mutate(MutationKind::Create, sync, create, source, destination, events).await;
    let updated = mutate(MutationKind::Update, sync, update, source, destination, events).await;
    let deletion = delete(sync, to_delete, orphans, destination, events).await;

    let mut failed = errors;
    failed.extend(created.failed);
    failed.extend(updated.failed);
    failed.extend(deletion.failed);

    let outcome = RunOutcome {
        created: &created.succeeded,
        updated: &updated.succeeded,
        deleted: &deletion.deleted,
        failed: &failed,
    };
    writeback(ctx, outcome, events, Utc::now()).await;

    let summary = SyncSummary {
        created: created.succeeded.len(),
        updated: updated.succeeded.len(),
        deleted: deletion.deleted.len() + deletion.orphans_deleted.len(),
        failed: failed.len(),
    };
    if let Some(logs) = logs.as_mut() {
        logs.created = created.succeeded;
        logs.updated = updated.succeeded;
        logs.deleted = deletion.deleted;
        logs.failed = failed;
        logs.orphans_deleted = deletion.orphans_deleted;
        logs.orphans_failed = deletion.orphans_failed;
    }

    let elapsed_secs = started.elapsed().as_secs_f64();
    info!(
        sync = %sync.name,
        created = summary.created,
        updated = summary.updated,
        deleted = summary.deleted,
        failed = summary.failed,
        elapsed_secs,
        "sync finished"
    );
    events.complete(CompletionEvent {
        elapsed_secs,
        summary,
        logs,
    });
    Ok(summary)
}
