// flowsync/src/webflow/client.rs
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use super::models::{ItemRef, ItemsRequest, ItemsResponse, ListItemsResponse, NewItem};
use crate::errors::{AppError, Result};
use crate::http;
use crate::model::DestinationItem;
use crate::sync::api::{DESTINATION_BATCH_LIMIT, DestinationApi, ItemUpdate};

const SERVICE: &str = "Webflow";
const BASE_URL: &str = "https://api.webflow.com/v2";
const PAGE_SIZE: usize = 100;

pub struct WebflowClient {
    token: String,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for WebflowClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebflowClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl WebflowClient {
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

    /// Item endpoint; the `/live` variant publishes to the site's subdomain.
    fn items_url(&self, collection_id: &str, live: bool) -> String {
        let suffix = if live { "/live" } else { "" };
        format!("{}/collections/{}/items{}", self.base_url, collection_id, suffix)
    }

    fn check_batch(len: usize) -> Result<()> {
        if len > DESTINATION_BATCH_LIMIT {
            return Err(AppError::InvalidInput(format!(
                "Webflow accepts at most {} items per request, got {}",
                DESTINATION_BATCH_LIMIT, len
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DestinationApi for WebflowClient {
    async fn list_items(&self, collection_id: &str) -> Result<Vec<DestinationItem>> {
        let url = self.items_url(collection_id, false);
        let mut items = Vec::new();

        loop {
            let request = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .query(&[("offset", items.len()), ("limit", PAGE_SIZE)]);
            let page: ListItemsResponse = http::read_json(SERVICE, http::send(SERVICE, request).await?).await?;
            let fetched = page.items.len();
            let total = page.pagination.map(|p| p.total).unwrap_or(0);
            items.extend(page.items);
            debug!(fetched, so_far = items.len(), total, "fetched Webflow page");

            if fetched == 0 || items.len() >= total {
                break;
            }
        }

        Ok(items)
    }

    async fn create_items(
        &self,
        collection_id: &str,
        items: &[Map<String, Value>],
        live: bool,
    ) -> Result<Vec<DestinationItem>> {
        Self::check_batch(items.len())?;
        let body = ItemsRequest {
            items: items
                .iter()
                .map(|field_data| NewItem {
                    is_archived: false,
                    is_draft: false,
                    field_data,
                })
                .collect(),
        };
        let request = self
            .client
            .post(self.items_url(collection_id, live))
            .bearer_auth(&self.token)
            .json(&body);
        let response: ItemsResponse = http::read_json(SERVICE, http::send(SERVICE, request).await?).await?;
        Ok(response.into_items())
    }

    async fn update_items(
        &self,
        collection_id: &str,
        items: &[ItemUpdate],
        live: bool,
    ) -> Result<Vec<DestinationItem>> {
        Self::check_batch(items.len())?;
        let body = ItemsRequest { items: items.to_vec() };
        let request = self
            .client
            .patch(self.items_url(collection_id, live))
            .bearer_auth(&self.token)
            .json(&body);
        let response: ItemsResponse = http::read_json(SERVICE, http::send(SERVICE, request).await?).await?;
        Ok(response.into_items())
    }

    async fn delete_items(&self, collection_id: &str, item_ids: &[String], live: bool) -> Result<()> {
        Self::check_batch(item_ids.len())?;
        let body = ItemsRequest {
            items: item_ids.iter().map(|id| ItemRef { id }).collect(),
        };
        let request = self
            .client
            .delete(self.items_url(collection_id, live))
            .bearer_auth(&self.token)
            .json(&body);
        http::expect_success(SERVICE, http::send(SERVICE, request).await?).await
    }
}
