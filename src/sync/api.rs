// flowsync/src/sync/api.rs
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::Result;
use crate::model::{DestinationItem, SourceRecord};

/// Airtable bulk-update limit per request.
pub const SOURCE_UPDATE_LIMIT: usize = 10;
/// Webflow bulk create/update/delete limit per request.
pub const DESTINATION_BATCH_LIMIT: usize = 100;

/// Field values to merge into one source record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordUpdate {
    pub id: String,
    pub fields: Map<String, Value>,
}

/// New field data for one existing destination item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemUpdate {
    pub id: String,
    pub field_data: Map<String, Value>,
}

/// The system records are read from and status is written back to.
#[async_trait]
pub trait SourceApi: Send + Sync {
    async fn list_records(
        &self,
        base_id: &str,
        table_id: &str,
        view_id: Option<&str>,
    ) -> Result<Vec<SourceRecord>>;

    async fn get_record(&self, base_id: &str, table_id: &str, record_id: &str) -> Result<SourceRecord>;

    /// Merges `fields` into each record; at most [`SOURCE_UPDATE_LIMIT`] per call.
    async fn update_records(
        &self,
        base_id: &str,
        table_id: &str,
        updates: &[RecordUpdate],
    ) -> Result<Vec<SourceRecord>>;
}

/// The CMS collection records are mirrored into.
///
/// Bulk responses are not guaranteed to preserve request order.
#[async_trait]
pub trait DestinationApi: Send + Sync {
    async fn list_items(&self, collection_id: &str) -> Result<Vec<DestinationItem>>;

    async fn create_items(
        &self,
        collection_id: &str,
        items: &[Map<String, Value>],
        live: bool,
    ) -> Result<Vec<DestinationItem>>;

    async fn update_items(
        &self,
        collection_id: &str,
        items: &[ItemUpdate],
        live: bool,
    ) -> Result<Vec<DestinationItem>>;

    async fn delete_items(&self, collection_id: &str, item_ids: &[String], live: bool) -> Result<()>;
}
