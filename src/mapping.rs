//! Mapping definitions.
//!
//! A `Mapping` binds a request predicate (method, URL pattern, required query
//! parameters, required JSON body fields) to a canned response. Mappings are
//! pure data; all matching logic lives in [`crate::index`].

use crate::error::MockError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Priority assigned to mappings that do not set one. Lower values win.
pub const DEFAULT_PRIORITY: i64 = 1000;

/// A single stub definition, as loaded from a mapping file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Mapping {
    /// Unique identifier for this mapping
    pub id: String,

    /// Lower value wins; absent means [`DEFAULT_PRIORITY`].
    /// An explicit 0 is honored as top priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,

    /// Optional human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Request predicate
    pub request: RequestSpec,

    /// Response to return
    pub response: ResponseSpec,

    /// Mapping metadata (tags, enabled flag)
    #[serde(default)]
    pub metadata: Metadata,
}

impl Mapping {
    /// Validate and normalize in place: trims and upper-cases the method,
    /// fills in the default priority, rejects empty id/method/urlPattern.
    pub fn normalize(&mut self) -> Result<(), MockError> {
        if self.id.trim().is_empty() {
            return Err(MockError::InvalidMapping {
                id: self.id.clone(),
                reason: "missing mapping.id",
            });
        }
        self.request.method = self.request.method.trim().to_uppercase();
        if self.request.method.is_empty() {
            return Err(MockError::InvalidMapping {
                id: self.id.clone(),
                reason: "missing request.method",
            });
        }
        if self.request.url_pattern.trim().is_empty() {
            return Err(MockError::InvalidMapping {
                id: self.id.clone(),
                reason: "missing request.urlPattern",
            });
        }
        if self.priority.is_none() {
            self.priority = Some(DEFAULT_PRIORITY);
        }
        Ok(())
    }

    /// Whether this mapping should be added to the runtime index.
    pub fn is_enabled(&self) -> bool {
        self.metadata.enabled.unwrap_or(true)
    }
}

/// Request predicate: all listed constraints must hold for a match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RequestSpec {
    /// HTTP method; normalized to upper-case at add time
    pub method: String,

    /// Pattern matched against the request URL/path
    pub url_pattern: String,

    /// How `url_pattern` is matched: "contains" (default), "exact",
    /// "prefix", or "regex". Unrecognized values fall back to "contains".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_match: Option<String>,

    /// Required query key=value pairs. All listed pairs must be present and
    /// equal in the incoming request.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub query_params: HashMap<String, String>,

    /// Required JSON body fields: dot-notation path -> expected scalar value
    /// (e.g. "customer.email"). All listed fields must exist and be equal.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub body: HashMap<String, serde_json::Value>,
}

/// Canned response template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResponseSpec {
    /// HTTP status code; 0 means "use 200" and is resolved at dispatch time
    #[serde(default)]
    pub status: u16,

    /// Response headers, case preserved as provided
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,

    /// Response body, opaque to matching; JSON-encoded by the transport layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,

    /// Simulated latency applied at dispatch, not at matching
    #[serde(default)]
    pub fixed_delay_ms: u64,
}

/// Mapping metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Absent or `true` means enabled; `false` keeps the mapping out of the
    /// runtime index (it is still visible to introspection).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// The normalized shape of one incoming HTTP call, as matched against stubs.
/// The HTTP layer adapts a hyper request into this.
#[derive(Debug, Clone, Default)]
pub struct IncomingRequest {
    pub method: String,
    /// Typically the path (e.g. "/users/123/orders"); a full URL also works.
    pub url: String,
    /// Query parameters; HTTP allows repeated keys, so values are lists.
    pub query: HashMap<String, Vec<String>>,
    /// Decoded JSON body, or a JSON string for non-JSON payloads.
    pub body: Option<serde_json::Value>,
}
