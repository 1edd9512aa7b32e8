//! # Gateway Client
//!
//! Thin reqwest wrapper shared by every endpoint module.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  get_json("products", query)           send_json(POST, "orders", body)  │
//! │       │                                      │                          │
//! │       ▼                                      ▼                          │
//! │  ┌──────────────────────┐             ┌──────────────────────┐          │
//! │  │ retry with backoff   │             │ single attempt       │          │
//! │  │ (retryable errors,   │             │ (writes are not      │          │
//! │  │  up to max_retries)  │             │  idempotent)         │          │
//! │  └──────────┬───────────┘             └──────────┬───────────┘          │
//! │             └───────────────┬────────────────────┘                      │
//! │                             ▼                                           │
//! │  read_response: 2xx → JSON decode                                       │
//! │                 `success: false` → Rejected(message)                    │
//! │                 other status → Http { status, body }                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};

/// HTTP client for the commerce gateway.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: Url,
    config: GatewayConfig,
}

impl GatewayClient {
    /// Builds a client from a validated configuration.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        config.validate()?;
        let base_url = config.parsed_base_url()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;

        debug!(base_url = %base_url, "Gateway client created");

        Ok(GatewayClient {
            http,
            base_url,
            config,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    pub fn endpoint(&self, segments: &[&str]) -> GatewayResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// GETs JSON, retrying transient failures with exponential backoff.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> GatewayResult<T> {
        let mut url = self.endpoint(segments)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }

        let url = &url;
        let max_retries = self.config.max_retries;
        let mut attempts = 0u32;

        backoff::future::retry(self.config.backoff(), || {
            attempts += 1;
            let attempt = attempts;
            async move {
                self.get_once(url).await.map_err(|err| {
                    if err.is_retryable() && attempt <= max_retries {
                        warn!(url = %url, attempt, error = %err, "Gateway read failed, retrying");
                        backoff::Error::transient(err)
                    } else {
                        backoff::Error::permanent(err)
                    }
                })
            }
        })
        .await
    }

    async fn get_once<T: DeserializeOwned>(&self, url: &Url) -> GatewayResult<T> {
        debug!(url = %url, "GET");
        let response = self.http.get(url.clone()).send().await?;
        read_response(response).await
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Sends a JSON body once. Writes are never retried.
    pub(crate) async fn send_json<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> GatewayResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        debug!(method = %method, url = %url, "Sending");

        let response = self
            .http
            .request(method, url)
            .json(body)
            .send()
            .await?;

        read_response(response).await
    }
}

// =============================================================================
// Response Handling
// =============================================================================

async fn read_response<T: DeserializeOwned>(response: Response) -> GatewayResult<T> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        debug!(status = status.as_u16(), "Gateway returned error status");
        return Err(GatewayError::http(status.as_u16(), &text));
    }

    decode_body(&text)
}

/// Decodes a 2xx body, turning `{"success": false, "message": ...}` into
/// [`GatewayError::Rejected`].
pub(crate) fn decode_body<T: DeserializeOwned>(text: &str) -> GatewayResult<T> {
    let value: Value = serde_json::from_str(text)?;
    check_envelope(&value)?;
    Ok(serde_json::from_value(value)?)
}

/// Returns the list under `field`, or `value` itself when it is a bare array.
pub(crate) fn take_list<T: DeserializeOwned>(mut value: Value, field: &str) -> GatewayResult<Vec<T>> {
    if let Some(inner) = value.get_mut(field) {
        value = inner.take();
    }
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Null => Ok(Vec::new()),
        other => Err(GatewayError::Decode(format!(
            "expected a list of {field}, got {}",
            kind(&other)
        ))),
    }
}

/// Returns the object under `field`, or `value` itself.
pub(crate) fn take_object<T: DeserializeOwned>(mut value: Value, field: &str) -> GatewayResult<T> {
    if let Some(inner) = value.get_mut(field).filter(|v| v.is_object()) {
        value = inner.take();
    }
    Ok(serde_json::from_value(value)?)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Fails when the gateway flagged the request as unsuccessful.
pub(crate) fn check_envelope(value: &Value) -> GatewayResult<()> {
    if value.get("success").and_then(Value::as_bool) == Some(false) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("The request was rejected")
            .to_string();
        return Err(GatewayError::Rejected(message));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
