//! In-memory Airtable and Webflow stand-ins for engine tests.
//!
//! Both fakes fail a whole request when any element of it is marked as
//! failing, like the real APIs do for a bad item inside a bulk call.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::errors::{AppError, Result};
use crate::model::{DestinationItem, SourceRecord};
use crate::sync::api::{DestinationApi, ItemUpdate, RecordUpdate, SourceApi};

fn api_error(service: &'static str, message: String) -> AppError {
    AppError::Api {
        service,
        status: 422,
        message,
    }
}

#[derive(Default)]
pub struct FakeSource {
    pub records: Vec<SourceRecord>,
    /// Linked-table records, keyed by (table id, record id).
    pub linked: HashMap<(String, String), SourceRecord>,
    pub failing_updates: HashSet<String>,
    pub fail_list: bool,
    pub update_calls: Mutex<Vec<Vec<RecordUpdate>>>,
    pub lookups: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn with_records(records: Vec<SourceRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn link(mut self, table_id: &str, record: SourceRecord) -> Self {
        self.linked
            .insert((table_id.to_string(), record.id.clone()), record);
        self
    }

    /// All updates that were accepted, flattened.
    pub fn applied_updates(&self) -> Vec<RecordUpdate> {
        let calls = self.update_calls.lock().unwrap();
        calls
            .iter()
            .filter(|batch| !batch.iter().any(|u| self.failing_updates.contains(&u.id)))
            .flatten()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SourceApi for FakeSource {
    async fn list_records(&self, _base: &str, _table: &str, _view: Option<&str>) -> Result<Vec<SourceRecord>> {
        if self.fail_list {
            return Err(api_error("Airtable", "NOT_AUTHORIZED".to_string()));
        }
        Ok(self.records.clone())
    }

    async fn get_record(&self, _base: &str, table_id: &str, record_id: &str) -> Result<SourceRecord> {
        self.lookups.lock().unwrap().push(record_id.to_string());
        self.linked
            .get(&(table_id.to_string(), record_id.to_string()))
            .cloned()
            .ok_or_else(|| AppError::Api {
                service: "Airtable",
                status: 404,
                message: "NOT_FOUND".to_string(),
            })
    }

    async fn update_records(&self, _base: &str, _table: &str, updates: &[RecordUpdate]) -> Result<Vec<SourceRecord>> {
        self.update_calls.lock().unwrap().push(updates.to_vec());
        if let Some(bad) = updates.iter().find(|u| self.failing_updates.contains(&u.id)) {
            return Err(api_error("Airtable", format!("INVALID_RECORDS: cannot update {}", bad.id)));
        }
        Ok(updates
            .iter()
            .map(|u| SourceRecord {
                id: u.id.clone(),
                created_time: None,
                fields: u.fields.clone(),
            })
            .collect())
    }
}

#[derive(Default)]
pub struct FakeDestination {
    pub items: Mutex<Vec<DestinationItem>>,
    pub failing_slugs: HashSet<String>,
    pub failing_deletes: HashSet<String>,
    pub fail_list: bool,
    /// Return bulk results in reverse request order.
    pub reverse_responses: bool,
    /// (operation, batch size) per call.
    pub calls: Mutex<Vec<(&'static str, usize)>>,
    pub next_id: Mutex<usize>,
}

impl FakeDestination {
    pub fn with_items(items: Vec<DestinationItem>) -> Self {
        Self {
            items: Mutex::new(items),
            ..Self::default()
        }
    }

    pub fn item_ids(&self) -> Vec<String> {
        self.items.lock().unwrap().iter().map(|i| i.id.clone()).collect()
    }

    pub fn batch_sizes(&self, operation: &str) -> Vec<usize> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(op, _)| *op == operation)
            .map(|(_, size)| *size)
            .collect()
    }

    fn reject_bad_slug(&self, field_data: &[&Map<String, Value>]) -> Result<()> {
        for data in field_data {
            if let Some(slug) = data.get("slug").and_then(Value::as_str) {
                if self.failing_slugs.contains(slug) {
                    return Err(api_error(
                        "Webflow",
                        format!("Validation Error (fieldData.slug: '{}' is not allowed)", slug),
                    ));
                }
            }
        }
        Ok(())
    }

    fn finish(&self, mut items: Vec<DestinationItem>) -> Vec<DestinationItem> {
        if self.reverse_responses {
            items.reverse();
        }
        items
    }
}

#[async_trait]
impl DestinationApi for FakeDestination {
    async fn list_items(&self, _collection_id: &str) -> Result<Vec<DestinationItem>> {
        if self.fail_list {
            return Err(api_error("Webflow", "Collection not found".to_string()));
        }
        Ok(self.items.lock().unwrap().clone())
    }

    async fn create_items(&self, _collection_id: &str, items: &[Map<String, Value>], _live: bool) -> Result<Vec<DestinationItem>> {
        self.calls.lock().unwrap().push(("create", items.len()));
        self.reject_bad_slug(&items.iter().collect::<Vec<_>>())?;

        let mut stored = self.items.lock().unwrap();
        let mut next_id = self.next_id.lock().unwrap();
        let mut created = Vec::new();
        for field_data in items {
            let mut field_data = field_data.clone();
            // Colliding slugs get a random-looking four character suffix.
            if let Some(slug) = field_data.get("slug").and_then(Value::as_str).map(str::to_string) {
                if stored.iter().any(|i| i.slug() == Some(slug.as_str())) {
                    field_data.insert("slug".into(), Value::String(format!("{}-{:04x}", slug, 0xa1b0 + *next_id)));
                }
            }
            *next_id += 1;
            let item = DestinationItem {
                id: format!("itm_new_{}", *next_id),
                is_archived: false,
                is_draft: false,
                last_published: None,
                last_updated: None,
                created_on: None,
                field_data,
            };
            stored.push(item.clone());
            created.push(item);
        }
        Ok(self.finish(created))
    }

    async fn update_items(&self, _collection_id: &str, items: &[ItemUpdate], _live: bool) -> Result<Vec<DestinationItem>> {
        self.calls.lock().unwrap().push(("update", items.len()));
        self.reject_bad_slug(&items.iter().map(|u| &u.field_data).collect::<Vec<_>>())?;

        let mut stored = self.items.lock().unwrap();
        if let Some(missing) = items.iter().find(|u| !stored.iter().any(|i| i.id == u.id)) {
            return Err(api_error("Webflow", format!("Item {} not found", missing.id)));
        }
        let mut updated = Vec::new();
        for update in items {
            if let Some(existing) = stored.iter_mut().find(|i| i.id == update.id) {
                existing.field_data = update.field_data.clone();
                updated.push(existing.clone());
            }
        }
        Ok(self.finish(updated))
    }

    async fn delete_items(&self, _collection_id: &str, item_ids: &[String], _live: bool) -> Result<()> {
        self.calls.lock().unwrap().push(("delete", item_ids.len()));
        if let Some(bad) = item_ids.iter().find(|id| self.failing_deletes.contains(*id)) {
            return Err(api_error("Webflow", format!("Item {} is referenced elsewhere", bad)));
        }
        self.items
            .lock()
            .unwrap()
            .retain(|i| !item_ids.contains(&i.id));
        Ok(())
    }
}
