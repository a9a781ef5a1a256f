//! Tiered batch back-off.
//!
//! Items are sent in batches of the first tier size. Every item of a failed
//! multi-item batch is retried at the next, smaller tier; a failed batch of
//! one is final and keeps the API's own error message. Tiers run strictly one
//! after another because each needs the exact failure set of the previous one.

use async_trait::async_trait;
use tracing::debug;

use crate::errors::AppError;
use crate::sync::api::{DESTINATION_BATCH_LIMIT, SOURCE_UPDATE_LIMIT};

/// Webflow create/update/delete: bulk limit, then tens, then one at a time.
pub const ITEM_TIERS: &[usize] = &[DESTINATION_BATCH_LIMIT, 10, 1];
/// Airtable updates: the bulk limit is already ten.
pub const RECORD_TIERS: &[usize] = &[SOURCE_UPDATE_LIMIT, 1];

#[async_trait]
pub trait BatchOperation: Send + Sync {
    type Item: Clone + Send + Sync;
    type Output: Send;

    /// Applies one batch; on success returns whatever the batch produced.
    async fn apply(&self, batch: &[Self::Item]) -> Result<Vec<Self::Output>, AppError>;
}

#[derive(Debug)]
pub struct TieredOutcome<I, O> {
    pub succeeded: Vec<O>,
    pub failed: Vec<(I, String)>,
}

impl<I, O> Default for TieredOutcome<I, O> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// Runs `items` through `operation` tier by tier. `on_settled` is called with
/// the number of items whose fate became final after each request.
pub async fn run_in_tiers<Op>(
    operation: &Op,
    items: Vec<Op::Item>,
    tiers: &[usize],
    on_settled: &mut (dyn FnMut(usize) + Send),
) -> TieredOutcome<Op::Item, Op::Output>
where
    Op: BatchOperation + ?Sized,
{
    let mut outcome = TieredOutcome::default();
    let mut pending = items;

    for (tier, &size) in tiers.iter().enumerate() {
        if pending.is_empty() {
            break;
        }
        let size = size.max(1);
        let last_tier = tier + 1 == tiers.len();
        let mut retry = Vec::new();

        for batch in pending.chunks(size) {
            match operation.apply(batch).await {
                Ok(output) => {
                    outcome.succeeded.extend(output);
                    on_settled(batch.len());
                }
                Err(e) if batch.len() == 1 => {
                    debug!(tier = size, error = %e, "item failed on its own");
                    outcome.failed.push((batch[0].clone(), e.record_message()));
                    on_settled(1);
                }
                Err(e) if last_tier => {
                    // No finer tier left to isolate the culprit.
                    let message = e.record_message();
                    outcome
                        .failed
                        .extend(batch.iter().cloned().map(|item| (item, message.clone())));
                    on_settled(batch.len());
                }
                Err(e) => {
                    debug!(tier = size, batch = batch.len(), error = %e, "batch failed, retrying at next tier");
                    retry.extend_from_slice(batch);
                }
            }
        }
        pending = retry;
    }

    outcome
}
