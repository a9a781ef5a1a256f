//! Response handling shared by the Airtable and Webflow clients.

use reqwest::header::RETRY_AFTER;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::{AppError, Result};

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RATE_LIMIT_RETRIES: u32 = 3;
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);
const MAX_RAW_ERROR_LEN: usize = 500;

pub(crate) fn build_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

/// Parses a `Retry-After` header given in seconds.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Sends a request, waiting out HTTP 429 responses a bounded number of times.
pub(crate) async fn send(service: &'static str, request: RequestBuilder) -> Result<Response> {
    let mut attempt = 0;
    loop {
        let current = request.try_clone().ok_or_else(|| {
            AppError::InvalidInput(format!("{} request body cannot be replayed", service))
        })?;
        let response = current.send().await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS && attempt < MAX_RATE_LIMIT_RETRIES {
            let wait = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after)
                .unwrap_or(DEFAULT_RETRY_AFTER);
            attempt += 1;
            warn!(service, attempt, wait_secs = wait.as_secs(), "rate limited, retrying");
            tokio::time::sleep(wait).await;
            continue;
        }
        return Ok(response);
    }
}

/// Decodes a successful JSON body, or turns the response into `AppError::Api`.
pub(crate) async fn read_json<T: DeserializeOwned>(service: &'static str, response: Response) -> Result<T> {
    let body = read_success_body(service, response).await?;
    Ok(serde_json::from_str(&body)?)
}

/// Like [`read_json`] for endpoints whose success body is irrelevant.
pub(crate) async fn expect_success(service: &'static str, response: Response) -> Result<()> {
    read_success_body(service, response).await.map(|_| ())
}

async fn read_success_body(service: &'static str, response: Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        return Ok(body);
    }
    debug!(service, status = status.as_u16(), body = %body, "request failed");
    Err(AppError::Api {
        service,
        status: status.as_u16(),
        message: extract_error_message(&body),
    })
}

/// Pulls the human message out of an API error body.
///
/// Understands Airtable (`{"error": {"type", "message"}}` or `{"error": "TYPE"}`)
/// and Webflow (`{"code", "message", "details": [{"param", "description"}]}`);
/// anything else is returned raw, truncated.
pub fn extract_error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return truncate(body);
    };

    match json.get("error") {
        Some(Value::Object(err)) => {
            let message = err.get("message").and_then(Value::as_str);
            let kind = err.get("type").and_then(Value::as_str);
            match (kind, message) {
                (Some(kind), Some(message)) => return format!("{}: {}", kind, message),
                (None, Some(message)) => return message.to_string(),
                (Some(kind), None) => return kind.to_string(),
                (None, None) => {}
            }
        }
        Some(Value::String(kind)) => return kind.clone(),
        _ => {}
    }

    if let Some(message) = json.get("message").and_then(Value::as_str) {
        let details: Vec<String> = json
            .get("details")
            .and_then(Value::as_array)
            .map(|details| {
                details
                    .iter()
                    .filter_map(|d| match d {
                        Value::String(s) => Some(s.clone()),
                        Value::Object(obj) => {
                            let description = obj.get("description").and_then(Value::as_str)?;
                            Some(match obj.get("param").and_then(Value::as_str) {
                                Some(param) => format!("{}: {}", param, description),
                                None => description.to_string(),
                            })
                        }
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();
        return if details.is_empty() {
            message.to_string()
        } else {
            format!("{} ({})", message, details.join("; "))
        };
    }

    truncate(body)
}

fn truncate(body: &str) -> String {
    if body.chars().count() > MAX_RAW_ERROR_LEN {
        let cut: String = body.chars().take(MAX_RAW_ERROR_LEN).collect();
        format!("{}... (truncated)", cut)
    } else {
        body.to_string()
    }
}
