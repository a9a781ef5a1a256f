// flowsync/src/airtable/client.rs
use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::models::{ListRecordsResponse, UpdateRecordsRequest, UpdateRecordsResponse};
use crate::errors::{AppError, Result};
use crate::http;
use crate::model::SourceRecord;
use crate::sync::api::{RecordUpdate, SOURCE_UPDATE_LIMIT, SourceApi};

const SERVICE: &str = "Airtable";
const BASE_URL: &str = "https://api.airtable.com/v0";

pub struct AirtableClient {
    token: String,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for AirtableClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AirtableClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AirtableClient {
    pub fn new(token: &str) -> Result<Self> {
        Self::with_base_url(token, BASE_URL)
    }

    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url)?;
        Ok(Self {
            token: token.to_string(),
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            client: http::build_client()?,
        })
    }

    fn table_url(&self, base_id: &str, table_id: &str) -> String {
        format!("{}/{}/{}", self.base_url, base_id, table_id)
    }
}

#[async_trait]
impl SourceApi for AirtableClient {
    async fn list_records(
        &self,
        base_id: &str,
        table_id: &str,
        view_id: Option<&str>,
    ) -> Result<Vec<SourceRecord>> {
        let url = self.table_url(base_id, table_id);
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut query: Vec<(&str, String)> = vec![("returnFieldsByFieldId", "true".to_string())];
            if let Some(view) = view_id {
                query.push(("view", view.to_string()));
            }
            if let Some(offset) = &offset {
                query.push(("offset", offset.clone()));
            }

            let request = self.client.get(&url).bearer_auth(&self.token).query(&query);
            let page: ListRecordsResponse = http::read_json(SERVICE, http::send(SERVICE, request).await?).await?;
            debug!(count = page.records.len(), more = page.offset.is_some(), "fetched Airtable page");
            records.extend(page.records);

            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(records)
    }

    async fn get_record(&self, base_id: &str, table_id: &str, record_id: &str) -> Result<SourceRecord> {
        let url = format!("{}/{}", self.table_url(base_id, table_id), record_id);
        let request = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("returnFieldsByFieldId", "true")]);
        http::read_json(SERVICE, http::send(SERVICE, request).await?).await
    }

    async fn update_records(
        &self,
        base_id: &str,
        table_id: &str,
        updates: &[RecordUpdate],
    ) -> Result<Vec<SourceRecord>> {
        if updates.len() > SOURCE_UPDATE_LIMIT {
            return Err(AppError::InvalidInput(format!(
                "Airtable accepts at most {} records per update, got {}",
                SOURCE_UPDATE_LIMIT,
                updates.len()
            )));
        }
        let body = UpdateRecordsRequest {
            records: updates,
            return_fields_by_field_id: true,
        };
        let request = self
            .client
            .patch(self.table_url(base_id, table_id))
            .bearer_auth(&self.token)
            .json(&body);
        let response: UpdateRecordsResponse = http::read_json(SERVICE, http::send(SERVICE, request).await?).await?;
        Ok(response.records)
    }
}
