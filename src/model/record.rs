// flowsync/src/model/record.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::non_empty_text;

/// One row fetched from Airtable, keyed by field id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord {
    pub id: String,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl SourceRecord {
    pub fn field(&self, field_id: &str) -> Option<&Value> {
        self.fields.get(field_id)
    }

    /// Trimmed text of a field, `None` when absent or blank.
    pub fn text(&self, field_id: &str) -> Option<String> {
        non_empty_text(self.fields.get(field_id))
    }
}

/// One Webflow CMS item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationItem {
    pub id: String,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_draft: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_published: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    #[serde(default)]
    pub field_data: Map<String, Value>,
}

impl DestinationItem {
    pub fn slug(&self) -> Option<&str> {
        self.field_data.get("slug").and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.field_data.get("name").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    Skip,
    Create,
    Update,
    Delete,
    Error(String),
}

/// What to do with a record this run, and whether its stored item id must
/// survive orphan deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordAction {
    pub kind: ActionKind,
    pub preserve_item_id: bool,
}

impl RecordAction {
    pub fn new(kind: ActionKind, preserve_item_id: bool) -> Self {
        Self {
            kind,
            preserve_item_id,
        }
    }
}

/// A record converted to Webflow `fieldData`, ready to send.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRecord {
    pub record: SourceRecord,
    pub field_data: Map<String, Value>,
    /// Set on the update path: the item this record already points at.
    pub item_id: Option<String>,
}

impl ParsedRecord {
    pub fn slug(&self) -> Option<&str> {
        self.field_data.get("slug").and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.field_data.get("name").and_then(Value::as_str)
    }
}

/// A record paired with the Webflow item it was written as.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedItem {
    pub record: SourceRecord,
    pub item_id: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordWithErrors {
    pub record: SourceRecord,
    pub errors: Vec<String>,
}

impl RecordWithErrors {
    pub fn new(record: SourceRecord, error: impl Into<String>) -> Self {
        Self {
            record,
            errors: vec![error.into()],
        }
    }
}
