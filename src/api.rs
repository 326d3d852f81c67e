//! External API transport.
//!
//! `GraphQlTransport` is the seam between the pipeline and the network: it takes
//! a query string and returns the decoded JSON envelope. `WarcraftLogsClient` is
//! the reqwest-backed implementation used in production.

use std::future::Future;
use std::sync::Arc;

use log::debug;
use serde_json::{json, Value};

use crate::config::MAX_ERROR_BODY_LENGTH;
use crate::error_handling::FetchError;

/// Executes one GraphQL query and returns the response envelope.
///
/// Implementations must fail with `FetchError` on transport failures, non-2xx
/// statuses, undecodable bodies and GraphQL `errors`. No retry is expected.
pub trait GraphQlTransport {
    fn execute(&self, query: &str) -> impl Future<Output = Result<Value, FetchError>> + Send;
}

/// reqwest client bound to one endpoint and bearer token.
#[derive(Clone)]
pub struct WarcraftLogsClient {
    http: Arc<reqwest::Client>,
    endpoint: String,
    token: String,
}

impl std::fmt::Debug for WarcraftLogsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarcraftLogsClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl WarcraftLogsClient {
    pub fn new(
        http: Arc<reqwest::Client>,
        endpoint: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }

    async fn post(&self, query: &str) -> Result<Value, FetchError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&json!({ "query": query }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY_LENGTH),
            });
        }

        let envelope: Value = serde_json::from_str(&body)?;
        check_graphql_errors(&envelope)?;
        Ok(envelope)
    }
}

impl GraphQlTransport for WarcraftLogsClient {
    fn execute(&self, query: &str) -> impl Future<Output = Result<Value, FetchError>> + Send {
        let operation = query.split_whitespace().nth(1).unwrap_or("anonymous").to_string();
        async move {
            debug!("POST {} ({})", self.endpoint, operation);
            self.post(query).await
        }
    }
}

/// Fails when the envelope carries a non-empty GraphQL `errors` array.
pub(crate) fn check_graphql_errors(envelope: &Value) -> Result<(), FetchError> {
    let Some(errors) = envelope.get("errors").and_then(Value::as_array) else {
        return Ok(());
    };
    if errors.is_empty() {
        return Ok(());
    }
    let messages: Vec<&str> = errors
        .iter()
        .map(|e| e.get("message").and_then(Value::as_str).unwrap_or("unknown error"))
        .collect();
    Err(FetchError::Api(messages.join("; ")))
}

fn truncate(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let kept: String = body.chars().take(max_chars).collect();
    format!("{}... (truncated, {} bytes)", kept, body.len())
}
