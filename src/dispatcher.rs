//! Request dispatch: lookup, response assembly, simulated latency, history.

use crate::history::{CallHistory, CallRecord};
use crate::index::RuntimeIndex;
use crate::mapping::IncomingRequest;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What the transport layer serializes back to the client: a status code,
/// headers, and a structured body to JSON-encode.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Value,
}

/// Orchestrates one request: best-match lookup, response assembly, simulated
/// delay, history entry. Owns its collaborators by injection; there is no
/// ambient global state.
pub struct Dispatcher {
    index: Arc<RuntimeIndex>,
    history: Arc<CallHistory>,
}

impl Dispatcher {
    pub fn new(index: Arc<RuntimeIndex>, history: Arc<CallHistory>) -> Self {
        Dispatcher { index, history }
    }

    /// Serve one request. The simulated delay runs strictly after the index
    /// lookup has released its lock; a matched stub with a large delay cannot
    /// be aborted early. Exactly one history entry is recorded per call,
    /// matched or not.
    pub async fn dispatch(&self, request: IncomingRequest) -> DispatchOutcome {
        let received_at = Utc::now();
        let matched = self.index.find_best_match(&request);

        let (outcome, delay_ms) = match &matched {
            Some(mapping) => {
                info!(
                    mapping_id = %mapping.id,
                    method = %request.method,
                    url = %request.url,
                    "request matched mapping"
                );
                (build_outcome(mapping), mapping.response.fixed_delay_ms)
            }
            None => {
                warn!(
                    method = %request.method,
                    url = %request.url,
                    "no mapping found"
                );
                (not_found_outcome(&request), 0)
            }
        };

        self.history.record(CallRecord {
            time: received_at,
            method: request.method.clone(),
            url: request.url.clone(),
            query: request.query,
            request_body: request.body,
            mapping_id: matched.map(|m| m.id).unwrap_or_default(),
            status: outcome.status,
        });

        if delay_ms > 0 {
            debug!(delay_ms, "applying fixed delay");
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        outcome
    }
}

fn build_outcome(mapping: &crate::mapping::Mapping) -> DispatchOutcome {
    let response = &mapping.response;
    let status = if response.status == 0 { 200 } else { response.status };

    let mut headers = response.headers.clone();
    let has_content_type = headers.keys().any(|k| k.eq_ignore_ascii_case("content-type"));
    if !has_content_type {
        headers.insert("Content-Type".to_string(), "application/json".to_string());
    }

    DispatchOutcome {
        status,
        headers,
        body: response.body.clone().unwrap_or(Value::Null),
    }
}

fn not_found_outcome(request: &IncomingRequest) -> DispatchOutcome {
    let mut headers = HashMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    DispatchOutcome {
        status: 404,
        headers,
        body: json!({
            "error": "no mapping found",
            "method": request.method,
            "url": request.url,
        }),
    }
}
