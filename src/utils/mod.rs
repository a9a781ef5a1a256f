pub mod verbose_log;

use serde_json::Value;

/// Empty means "nothing to sync": null, blank strings, empty arrays/objects.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Coerces an Airtable cell value to display text.
///
/// Arrays are joined with `", "`; objects (collaborators, attachments, AI
/// text results) contribute their most human-readable key.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => ["name", "email", "url", "text", "value"]
            .iter()
            .find_map(|key| map.get(*key).filter(|v| !v.is_null()))
            .map(value_to_text)
            .unwrap_or_else(|| value.to_string()),
    }
}

/// Trimmed text of an optional value, `None` when absent or blank.
pub fn non_empty_text(value: Option<&Value>) -> Option<String> {
    let value = value?;
    if is_empty_value(value) {
        return None;
    }
    let text = value_to_text(value).trim().to_string();
    if text.is_empty() { None } else { Some(text) }
}
