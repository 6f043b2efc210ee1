// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::errors::TransportError;

/// Connection pool tuned for a single sequential scan
const POOL_IDLE_PER_HOST: usize = 8;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// GraphQL-over-POST transport.
///
/// Probes are single-shot by design: no retries, no caching. Each request
/// carries an explicit timeout, and pacing between probes is the caller's
/// responsibility.
#[derive(Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

/// Parsed GraphQL envelope `{data?, errors?}`; extensions are ignored.
#[derive(Debug, Clone)]
pub struct GraphqlResponse {
    pub status_code: u16,
    pub data: Option<Value>,
    pub errors: Vec<Value>,
}

impl GraphqlResponse {
    /// Whether the envelope carried non-null data
    pub fn has_data(&self) -> bool {
        self.data.as_ref().map(|d| !d.is_null()).unwrap_or(false)
    }

    pub fn errors(&self) -> &[Value] {
        &self.errors
    }

    /// Lowercased error messages, for keyword checks
    pub fn error_messages_lower(&self) -> Vec<String> {
        self.errors
            .iter()
            .filter_map(|e| e.get("message").and_then(|m| m.as_str()))
            .map(|m| m.to_lowercase())
            .collect()
    }

    /// Top-level field value under `data`, if any
    pub fn field_data(&self, field_name: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.get(field_name))
    }
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(concat!("gqlguard/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(POOL_IDLE_PER_HOST)
            .pool_idle_timeout(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// POST a GraphQL document wrapped as `{"query": <string>}`.
    ///
    /// 2xx responses with a parseable envelope are `Ok` even when the
    /// `errors` list is non-empty; grading partial errors is the caller's
    /// job. Everything else maps into a [`TransportError`].
    pub async fn post_graphql(
        &self,
        url: &str,
        query: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<GraphqlResponse, TransportError> {
        let payload = serde_json::json!({ "query": query });

        let mut request = self
            .client
            .post(url)
            .timeout(timeout)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");
        for (key, value) in headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = request
            .body(payload.to_string())
            .send()
            .await
            .map_err(TransportError::from_reqwest)?;

        let status = response.status();
        let status_code = status.as_u16();
        let body = response
            .text()
            .await
            .map_err(TransportError::from_reqwest)?;

        debug!(
            "[HTTP] POST {} -> {} ({} bytes)",
            url,
            status_code,
            body.len()
        );

        let envelope: Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(_) if status.is_success() => {
                return Err(TransportError::Other(format!(
                    "Respuesta no interpretable del endpoint ({} bytes)",
                    body.len()
                )));
            }
            Err(_) => {
                return Err(TransportError::Http {
                    status: status_code,
                    status_text: status_text(status),
                });
            }
        };

        if !status.is_success() {
            if let Some(errors) = envelope.get("errors").and_then(|e| e.as_array()) {
                if !errors.is_empty() {
                    let messages = errors
                        .iter()
                        .filter_map(|e| e.get("message").and_then(|m| m.as_str()))
                        .map(|m| m.to_string())
                        .collect();
                    return Err(TransportError::Graphql {
                        status: status_code,
                        messages,
                        errors: errors.clone(),
                    });
                }
            }
            if let Some(message) = envelope.get("message").and_then(|m| m.as_str()) {
                return Err(TransportError::Api {
                    status: status_code,
                    message: message.to_string(),
                });
            }
            return Err(TransportError::Http {
                status: status_code,
                status_text: status_text(status),
            });
        }

        let data = envelope.get("data").cloned();
        let errors = envelope
            .get("errors")
            .and_then(|e| e.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(GraphqlResponse {
            status_code,
            data,
            errors,
        })
    }
}

fn status_text(status: reqwest::StatusCode) -> String {
    status.canonical_reason().unwrap_or("Unknown").to_string()
}
