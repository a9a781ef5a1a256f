use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{AppError, Result};
use crate::model::ReferenceConfig;
use crate::sync::api::SourceApi;

/// Linked record ids from a `multipleRecordLinks` value (or a comma-separated string).
fn linked_ids(raw: &Value) -> Vec<String> {
    match raw {
        Value::Array(entries) => entries
            .iter()
            .filter_map(|entry| match entry {
                Value::String(id) => Some(id.trim().to_string()),
                Value::Object(map) => map.get("id").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .filter(|id| !id.is_empty())
            .collect(),
        Value::String(ids) => ids
            .split(',')
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Resolves linked Airtable records to the Webflow item ids stored on them.
///
/// A single reference takes the first linked record that resolves. A
/// multi-reference keeps every id that resolves and drops the rest; it only
/// fails when none resolve.
pub async fn resolve_references(
    raw: &Value,
    config: &ReferenceConfig,
    base_id: &str,
    source: &dyn SourceApi,
    multi: bool,
) -> Result<Value> {
    let ids = linked_ids(raw);
    let mut resolved = Vec::new();
    let mut unresolved = Vec::new();

    for id in &ids {
        match source.get_record(base_id, &config.linked_table_id, id).await {
            Ok(linked) => match linked.text(&config.linked_item_id_field_id) {
                Some(item_id) => {
                    resolved.push(item_id);
                    if !multi {
                        break;
                    }
                }
                None => unresolved.push(id.clone()),
            },
            Err(e) => {
                debug!(record_id = %id, error = %e, "linked record lookup failed");
                unresolved.push(id.clone());
            }
        }
    }

    if resolved.is_empty() {
        let field = config
            .linked_item_id_field_name
            .as_deref()
            .unwrap_or(&config.linked_item_id_field_id);
        return Err(AppError::field(format!(
            "Could not resolve linked record(s) {} to Webflow item IDs; make sure they are synced and have a value in \"{}\"",
            ids.join(", "),
            field
        )));
    }
    if multi && !unresolved.is_empty() {
        warn!(unresolved = ?unresolved, "skipping linked records without Webflow item IDs");
    }

    Ok(if multi {
        Value::Array(resolved.into_iter().map(Value::String).collect())
    } else {
        Value::String(resolved.swap_remove(0))
    })
}
