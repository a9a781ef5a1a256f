use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::DestinationItem;

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct ListItemsResponse {
    #[serde(default)]
    pub items: Vec<DestinationItem>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Bulk endpoints answer with `{"items": [...]}`; single-item calls answer
/// with the item itself.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ItemsResponse {
    Many { items: Vec<DestinationItem> },
    Single(DestinationItem),
}

impl ItemsResponse {
    pub fn into_items(self) -> Vec<DestinationItem> {
        match self {
            ItemsResponse::Many { items } => items,
            ItemsResponse::Single(item) => vec![item],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem<'a> {
    pub is_archived: bool,
    pub is_draft: bool,
    pub field_data: &'a Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct ItemsRequest<T> {
    pub items: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct ItemRef<'a> {
    pub id: &'a str,
}
