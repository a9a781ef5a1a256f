use serde::{Deserialize, Serialize};

use crate::model::SourceRecord;
use crate::sync::api::RecordUpdate;

#[derive(Debug, Deserialize)]
pub struct ListRecordsResponse {
    #[serde(default)]
    pub records: Vec<SourceRecord>,
    #[serde(default)]
    pub offset: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecordsRequest<'a> {
    pub records: &'a [RecordUpdate],
    pub return_fields_by_field_id: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRecordsResponse {
    #[serde(default)]
    pub records: Vec<SourceRecord>,
}
