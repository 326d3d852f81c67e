//! In-memory transport for unit tests.

use std::future::Future;
use std::sync::Mutex;

use serde_json::Value;

use crate::api::{check_graphql_errors, GraphQlTransport};
use crate::error_handling::FetchError;

/// Answers each query with the first canned envelope whose needles all occur in it.
#[derive(Default)]
pub(crate) struct CannedTransport {
    routes: Vec<(Vec<String>, Value)>,
    queries: Mutex<Vec<String>>,
}

impl CannedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn route(mut self, needles: &[&str], envelope: Value) -> Self {
        self.routes
            .push((needles.iter().map(|n| n.to_string()).collect(), envelope));
        self
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl GraphQlTransport for CannedTransport {
    fn execute(&self, query: &str) -> impl Future<Output = Result<Value, FetchError>> + Send {
        self.queries.lock().unwrap().push(query.to_string());
        let answer = self
            .routes
            .iter()
            .find(|(needles, _)| needles.iter().all(|n| query.contains(n.as_str())))
            .map(|(_, envelope)| envelope.clone());
        async move {
            let envelope = answer.ok_or_else(|| FetchError::Api("no canned response".into()))?;
            check_graphql_errors(&envelope)?;
            Ok(envelope)
        }
    }
}
