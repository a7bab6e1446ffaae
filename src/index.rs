//! Runtime matching index.
//!
//! Mappings are compiled into stubs and inserted into a four-level tree:
//!
//! ```text
//! method -> URL shape -> query signature -> body signature -> stubs
//! ```
//!
//! Nodes are deduplicated by canonical shape, so two mappings with identical
//! predicate sets land in the same leaf regardless of the key order in their
//! source files. A lookup scans the tree under a single read-lock acquisition
//! and selects the best surviving stub by priority (lower wins), then
//! specificity score (higher wins), then load order (earlier wins).
//!
//! The index is built incrementally with [`RuntimeIndex::add`] and wiped
//! wholesale with [`RuntimeIndex::reset`] on reload; in-flight lookups observe
//! either the pre-reset or post-reset tree, never a partially rebuilt one.

use crate::error::MockError;
use crate::fields::{lookup_dot_path, render_scalar, values_equal};
use crate::mapping::{IncomingRequest, Mapping, DEFAULT_PRIORITY};
use parking_lot::RwLock;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Reverse;
use std::collections::HashMap;

/// How a stub's `urlPattern` is matched against the request URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlMatchKind {
    Contains,
    Exact,
    Prefix,
    Regex,
}

impl UrlMatchKind {
    /// Parse the `urlMatch` string; unrecognized values fall back to
    /// `Contains` rather than erroring.
    fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or("").trim().to_lowercase().as_str() {
            "exact" => UrlMatchKind::Exact,
            "prefix" => UrlMatchKind::Prefix,
            "regex" => UrlMatchKind::Regex,
            _ => UrlMatchKind::Contains,
        }
    }

    /// Literal (non-regex) comparison. Regex nodes hold their compiled
    /// matcher and never reach this; if one does, contains is the safe
    /// fallback.
    fn matches_literal(self, pattern: &str, url: &str) -> bool {
        match self {
            UrlMatchKind::Exact => url == pattern,
            UrlMatchKind::Prefix => url.starts_with(pattern),
            UrlMatchKind::Contains | UrlMatchKind::Regex => url.contains(pattern),
        }
    }
}

/// One required body field: dot-path plus expected scalar.
#[derive(Debug, Clone)]
struct BodyFieldMatcher {
    path: String,
    expected: Value,
}

impl BodyFieldMatcher {
    fn matches(&self, body: &Value) -> bool {
        match lookup_dot_path(body, &self.path) {
            Ok(actual) => values_equal(actual, &self.expected),
            Err(_) => false,
        }
    }
}

/// The indexed, immutable runtime form of a mapping. Owned exclusively by the
/// index; predicate changes require a full reload.
#[derive(Debug)]
pub struct CompiledStub {
    mapping: Mapping,
    priority: i64,
    /// Load sequence number; the final tie-break. Never reused or renumbered.
    order: u64,
    url_kind: UrlMatchKind,
    pattern: String,
    regex: Option<Regex>,
    /// Canonical (trimmed, sorted) required query pairs
    query_pairs: Vec<(String, String)>,
    query_signature: String,
    /// Canonical (path-sorted) required body fields
    body_matchers: Vec<BodyFieldMatcher>,
    body_signature: String,
}

impl CompiledStub {
    /// Compile a normalized mapping. Fails only for an uncompilable regex
    /// pattern in regex mode.
    fn compile(mapping: Mapping, order: u64) -> Result<Self, MockError> {
        let url_kind = UrlMatchKind::parse(mapping.request.url_match.as_deref());
        let pattern = mapping.request.url_pattern.clone();

        let regex = if url_kind == UrlMatchKind::Regex {
            Some(
                Regex::new(&pattern).map_err(|source| MockError::InvalidRegex {
                    id: mapping.id.clone(),
                    source,
                })?,
            )
        } else {
            None
        };

        // Query signature: trimmed pairs, empty keys dropped, sorted by
        // (key, value) so identical predicate sets share a node.
        let mut query_pairs: Vec<(String, String)> = mapping
            .request
            .query_params
            .iter()
            .filter_map(|(k, v)| {
                let k = k.trim();
                if k.is_empty() {
                    None
                } else {
                    Some((k.to_string(), v.trim().to_string()))
                }
            })
            .collect();
        query_pairs.sort();
        let query_signature = query_pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        // Body signature: paths sorted lexicographically.
        let mut paths: Vec<&String> = mapping.request.body.keys().collect();
        paths.sort();
        let mut body_matchers = Vec::with_capacity(paths.len());
        let mut signature_parts = Vec::with_capacity(paths.len());
        for path in paths {
            let expected = mapping.request.body[path].clone();
            signature_parts.push(format!("{path}={}", render_scalar(&expected)));
            body_matchers.push(BodyFieldMatcher {
                path: path.clone(),
                expected,
            });
        }
        let body_signature = signature_parts.join("|");

        let priority = mapping.priority.unwrap_or(DEFAULT_PRIORITY);

        Ok(CompiledStub {
            mapping,
            priority,
            order,
            url_kind,
            pattern,
            regex,
            query_pairs,
            query_signature,
            body_matchers,
            body_signature,
        })
    }

    /// Higher means more constrained: exact beats prefix beats contains beats
    /// regex, then pattern length (capped), then body constraints weighted
    /// above query constraints.
    fn specificity(&self) -> i64 {
        let base: i64 = match self.url_kind {
            UrlMatchKind::Exact => 1000,
            UrlMatchKind::Prefix => 800,
            UrlMatchKind::Contains => 600,
            UrlMatchKind::Regex => 400,
        };
        base + self.pattern.len().min(200) as i64
            + 10 * self.query_pairs.len() as i64
            + 20 * self.body_matchers.len() as i64
    }

    /// Total selection order: priority asc, specificity desc, load order asc.
    fn selection_key(&self) -> (i64, Reverse<i64>, u64) {
        (self.priority, Reverse(self.specificity()), self.order)
    }
}

struct UrlNode {
    kind: UrlMatchKind,
    pattern: String,
    regex: Option<Regex>,
    queries: Vec<QueryNode>,
}

impl UrlNode {
    fn matches_url(&self, url: &str) -> bool {
        match (&self.kind, &self.regex) {
            (UrlMatchKind::Regex, Some(re)) => re.is_match(url),
            _ => self.kind.matches_literal(&self.pattern, url),
        }
    }
}

struct QueryNode {
    signature: String,
    required: Vec<(String, String)>,
    bodies: Vec<BodyNode>,
}

impl QueryNode {
    /// Every required pair must be present, with the expected value among the
    /// (possibly repeated) actual values. Zero requirements match anything.
    fn matches_query(&self, query: &HashMap<String, Vec<String>>) -> bool {
        self.required.iter().all(|(key, want)| {
            query
                .get(key)
                .is_some_and(|values| values.iter().any(|v| v == want))
        })
    }
}

struct BodyNode {
    signature: String,
    matchers: Vec<BodyFieldMatcher>,
    stubs: Vec<CompiledStub>,
}

impl BodyNode {
    /// Every required dot-path must resolve to an equal value. Zero
    /// requirements match anything, including an absent body.
    fn matches_body(&self, body: Option<&Value>) -> bool {
        if self.matchers.is_empty() {
            return true;
        }
        match body {
            Some(body) => self.matchers.iter().all(|m| m.matches(body)),
            None => false,
        }
    }
}

#[derive(Default)]
struct MethodNode {
    urls: Vec<UrlNode>,
}

impl MethodNode {
    fn insert(&mut self, stub: CompiledStub) {
        let url_idx = match self
            .urls
            .iter()
            .position(|u| u.kind == stub.url_kind && u.pattern == stub.pattern)
        {
            Some(idx) => idx,
            None => {
                self.urls.push(UrlNode {
                    kind: stub.url_kind,
                    pattern: stub.pattern.clone(),
                    regex: stub.regex.clone(),
                    queries: Vec::new(),
                });
                self.urls.len() - 1
            }
        };

        let url = &mut self.urls[url_idx];
        let query_idx = match url
            .queries
            .iter()
            .position(|q| q.signature == stub.query_signature)
        {
            Some(idx) => idx,
            None => {
                url.queries.push(QueryNode {
                    signature: stub.query_signature.clone(),
                    required: stub.query_pairs.clone(),
                    bodies: Vec::new(),
                });
                url.queries.len() - 1
            }
        };

        let query = &mut url.queries[query_idx];
        let body_idx = match query
            .bodies
            .iter()
            .position(|b| b.signature == stub.body_signature)
        {
            Some(idx) => idx,
            None => {
                query.bodies.push(BodyNode {
                    signature: stub.body_signature.clone(),
                    matchers: stub.body_matchers.clone(),
                    stubs: Vec::new(),
                });
                query.bodies.len() - 1
            }
        };

        query.bodies[body_idx].stubs.push(stub);
    }

    fn find_best(&self, request: &IncomingRequest) -> Option<&CompiledStub> {
        let mut best: Option<&CompiledStub> = None;
        for url in &self.urls {
            if !url.matches_url(&request.url) {
                continue;
            }
            for query in &url.queries {
                if !query.matches_query(&request.query) {
                    continue;
                }
                for body in &query.bodies {
                    if !body.matches_body(request.body.as_ref()) {
                        continue;
                    }
                    for stub in &body.stubs {
                        if best.map_or(true, |b| stub.selection_key() < b.selection_key()) {
                            best = Some(stub);
                        }
                    }
                }
            }
        }
        best
    }
}

#[derive(Default)]
struct IndexInner {
    methods: HashMap<String, MethodNode>,
    order: u64,
    count: usize,
}

/// Tree shape counters, for introspection and logging.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IndexStats {
    pub methods: usize,
    pub url_nodes: usize,
    pub query_nodes: usize,
    pub body_nodes: usize,
    pub stubs: usize,
}

/// The runtime matching index. Read concurrently by request tasks; `add` and
/// `reset` are serialized writes. No operation suspends while holding the
/// lock.
pub struct RuntimeIndex {
    inner: RwLock<IndexInner>,
}

impl RuntimeIndex {
    pub fn new() -> Self {
        RuntimeIndex {
            inner: RwLock::new(IndexInner::default()),
        }
    }

    /// Validate, compile, and insert one mapping.
    ///
    /// Disabled mappings are accepted but never indexed. The load-order
    /// counter is claimed before compilation and not handed back on failure,
    /// so the sequence may have gaps; order is only a relative tie-break.
    pub fn add(&self, mut mapping: Mapping) -> Result<(), MockError> {
        mapping.normalize()?;
        if !mapping.is_enabled() {
            return Ok(());
        }

        let order = {
            let mut inner = self.inner.write();
            inner.order += 1;
            inner.order
        };

        let stub = CompiledStub::compile(mapping, order)?;

        let mut inner = self.inner.write();
        let method = stub.mapping.request.method.clone();
        inner.methods.entry(method).or_default().insert(stub);
        inner.count += 1;
        Ok(())
    }

    /// Find the best-matching mapping for a request, or `None`.
    ///
    /// The entire tree scan runs under one read-lock acquisition, so a
    /// concurrent reset never leaks a half-built tree into a single call.
    pub fn find_best_match(&self, request: &IncomingRequest) -> Option<Mapping> {
        let method = request.method.trim().to_uppercase();
        let inner = self.inner.read();
        let node = inner.methods.get(&method)?;
        node.find_best(request).map(|stub| stub.mapping.clone())
    }

    /// Wipe the tree and restart the order counter; used for wholesale
    /// reload.
    pub fn reset(&self) {
        let mut inner = self.inner.write();
        *inner = IndexInner::default();
    }

    /// Number of indexed (enabled, successfully compiled) mappings.
    pub fn count(&self) -> usize {
        self.inner.read().count
    }

    pub fn stats(&self) -> IndexStats {
        let inner = self.inner.read();
        let mut stats = IndexStats {
            methods: inner.methods.len(),
            url_nodes: 0,
            query_nodes: 0,
            body_nodes: 0,
            stubs: 0,
        };
        for method in inner.methods.values() {
            stats.url_nodes += method.urls.len();
            for url in &method.urls {
                stats.query_nodes += url.queries.len();
                for query in &url.queries {
                    stats.body_nodes += query.bodies.len();
                    for body in &query.bodies {
                        stats.stubs += body.stubs.len();
                    }
                }
            }
        }
        stats
    }
}

impl Default for RuntimeIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(raw: serde_json::Value) -> Mapping {
        serde_json::from_value(raw).unwrap()
    }

    fn post_request(url: &str, query: &[(&str, &str)], body: Option<Value>) -> IncomingRequest {
        let mut q: HashMap<String, Vec<String>> = HashMap::new();
        for (k, v) in query {
            q.entry(k.to_string()).or_default().push(v.to_string());
        }
        IncomingRequest {
            method: "POST".to_string(),
            url: url.to_string(),
            query: q,
            body,
        }
    }

    #[test]
    fn test_add_and_find_by_query_value() {
        let index = RuntimeIndex::new();
        index
            .add(mapping(json!({
                "id": "m1",
                "request": {
                    "method": "POST",
                    "urlPattern": "/users_orders",
                    "queryParams": { "userId": "123" },
                    "body": { "orderType": "ALL" }
                },
                "response": { "status": 201 }
            })))
            .unwrap();
        index
            .add(mapping(json!({
                "id": "m2",
                "request": {
                    "method": "POST",
                    "urlPattern": "/users_orders",
                    "queryParams": { "userId": "456" },
                    "body": { "orderType": "ALL" }
                },
                "response": { "status": 202 }
            })))
            .unwrap();

        let req1 = post_request(
            "/users_orders",
            &[("userId", "123")],
            Some(json!({"orderType": "ALL"})),
        );
        assert_eq!(index.find_best_match(&req1).unwrap().id, "m1");

        let req2 = post_request(
            "/users_orders",
            &[("userId", "456")],
            Some(json!({"orderType": "ALL"})),
        );
        assert_eq!(index.find_best_match(&req2).unwrap().id, "m2");
    }

    #[test]
    fn test_specificity_beats_generic_at_equal_priority() {
        let index = RuntimeIndex::new();
        index
            .add(mapping(json!({
                "id": "generic",
                "request": { "method": "POST", "urlPattern": "/users_orders" },
                "response": { "status": 200 }
            })))
            .unwrap();
        index
            .add(mapping(json!({
                "id": "specific",
                "request": {
                    "method": "POST",
                    "urlPattern": "/orders",
                    "body": { "orderType": "ALL" }
                },
                "response": { "status": 201 }
            })))
            .unwrap();

        let req = post_request("/orders", &[], Some(json!({"orderType": "ALL"})));
        assert_eq!(index.find_best_match(&req).unwrap().id, "specific");
    }

    #[test]
    fn test_body_constraint_outranks_identical_looser_mapping() {
        let index = RuntimeIndex::new();
        index
            .add(mapping(json!({
                "id": "no-body",
                "request": { "method": "POST", "urlPattern": "/orders" },
                "response": { "status": 200 }
            })))
            .unwrap();
        index
            .add(mapping(json!({
                "id": "with-body",
                "request": {
                    "method": "POST",
                    "urlPattern": "/orders",
                    "body": { "orderType": "ALL" }
                },
                "response": { "status": 201 }
            })))
            .unwrap();

        // Both match; the body constraint raises specificity at equal
        // priority, and load order would have picked "no-body".
        let req = post_request("/orders", &[], Some(json!({"orderType": "ALL"})));
        assert_eq!(index.find_best_match(&req).unwrap().id, "with-body");
    }

    #[test]
    fn test_priority_dominates_specificity() {
        let index = RuntimeIndex::new();
        // Highly specific but low-priority (high value).
        index
            .add(mapping(json!({
                "id": "specific-but-late",
                "priority": 2000,
                "request": {
                    "method": "POST",
                    "urlPattern": "/orders",
                    "urlMatch": "exact",
                    "queryParams": { "a": "1" },
                    "body": { "orderType": "ALL" }
                },
                "response": { "status": 200 }
            })))
            .unwrap();
        index
            .add(mapping(json!({
                "id": "loose-but-first",
                "priority": 1,
                "request": { "method": "POST", "urlPattern": "/orders" },
                "response": { "status": 200 }
            })))
            .unwrap();

        let req = post_request("/orders", &[("a", "1")], Some(json!({"orderType": "ALL"})));
        assert_eq!(index.find_best_match(&req).unwrap().id, "loose-but-first");
    }

    #[test]
    fn test_explicit_zero_priority_wins() {
        let index = RuntimeIndex::new();
        index
            .add(mapping(json!({
                "id": "default-priority",
                "request": { "method": "GET", "urlPattern": "/v" },
                "response": { "status": 200 }
            })))
            .unwrap();
        index
            .add(mapping(json!({
                "id": "top-priority",
                "priority": 0,
                "request": { "method": "GET", "urlPattern": "/v" },
                "response": { "status": 200 }
            })))
            .unwrap();

        let req = IncomingRequest {
            method: "GET".to_string(),
            url: "/v".to_string(),
            ..Default::default()
        };
        assert_eq!(index.find_best_match(&req).unwrap().id, "top-priority");
    }

    #[test]
    fn test_order_breaks_full_ties() {
        let index = RuntimeIndex::new();
        for id in ["first", "second"] {
            index
                .add(mapping(json!({
                    "id": id,
                    "request": { "method": "GET", "urlPattern": "/same" },
                    "response": { "status": 200 }
                })))
                .unwrap();
        }

        let req = IncomingRequest {
            method: "GET".to_string(),
            url: "/same".to_string(),
            ..Default::default()
        };
        assert_eq!(index.find_best_match(&req).unwrap().id, "first");
    }

    #[test]
    fn test_find_is_deterministic() {
        let index = RuntimeIndex::new();
        for i in 0..20 {
            index
                .add(mapping(json!({
                    "id": format!("m{i}"),
                    "request": { "method": "GET", "urlPattern": "/dup" },
                    "response": { "status": 200 }
                })))
                .unwrap();
        }
        let req = IncomingRequest {
            method: "GET".to_string(),
            url: "/dup".to_string(),
            ..Default::default()
        };
        for _ in 0..50 {
            assert_eq!(index.find_best_match(&req).unwrap().id, "m0");
        }
    }

    #[test]
    fn test_disabled_mapping_never_indexed() {
        let index = RuntimeIndex::new();
        index
            .add(mapping(json!({
                "id": "off",
                "priority": 100,
                "request": { "method": "GET", "urlPattern": "/users_orders" },
                "response": { "status": 200 },
                "metadata": { "enabled": false }
            })))
            .unwrap();

        assert_eq!(index.count(), 0);
        let req = IncomingRequest {
            method: "GET".to_string(),
            url: "/users_orders".to_string(),
            ..Default::default()
        };
        assert!(index.find_best_match(&req).is_none());
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let index = RuntimeIndex::new();
        let err = index
            .add(mapping(json!({
                "id": "bad-regex",
                "request": {
                    "method": "GET",
                    "urlPattern": "/orders/(unclosed",
                    "urlMatch": "regex"
                },
                "response": { "status": 200 }
            })))
            .unwrap_err();
        assert!(matches!(err, MockError::InvalidRegex { .. }));
        assert_eq!(index.count(), 0);
    }

    #[test]
    fn test_unregistered_method_not_found() {
        let index = RuntimeIndex::new();
        index
            .add(mapping(json!({
                "id": "m",
                "request": { "method": "POST", "urlPattern": "/x" },
                "response": { "status": 200 }
            })))
            .unwrap();

        let req = IncomingRequest {
            method: "DELETE".to_string(),
            url: "/x".to_string(),
            ..Default::default()
        };
        assert!(index.find_best_match(&req).is_none());
    }

    #[test]
    fn test_method_matching_is_case_insensitive() {
        let index = RuntimeIndex::new();
        index
            .add(mapping(json!({
                "id": "m",
                "request": { "method": "post", "urlPattern": "/x" },
                "response": { "status": 200 }
            })))
            .unwrap();

        let req = IncomingRequest {
            method: "Post".to_string(),
            url: "/x".to_string(),
            ..Default::default()
        };
        assert_eq!(index.find_best_match(&req).unwrap().id, "m");
    }

    #[test]
    fn test_url_match_modes() {
        let index = RuntimeIndex::new();
        for (id, pattern, mode) in [
            ("exact", "/api/users", "exact"),
            ("prefix", "/api/", "prefix"),
            ("contains", "users", "contains"),
            ("regex", r"^/api/users/\d+$", "regex"),
        ] {
            index
                .add(mapping(json!({
                    "id": id,
                    "request": { "method": "GET", "urlPattern": pattern, "urlMatch": mode },
                    "response": { "status": 200 }
                })))
                .unwrap();
        }

        let find = |url: &str| {
            index.find_best_match(&IncomingRequest {
                method: "GET".to_string(),
                url: url.to_string(),
                ..Default::default()
            })
        };

        // Exact outranks prefix and contains on the same URL.
        assert_eq!(find("/api/users").unwrap().id, "exact");
        // Regex is the only mode matching the numeric suffix path besides
        // prefix/contains; prefix outscores both regex and contains.
        assert_eq!(find("/api/users/42").unwrap().id, "prefix");
        // Only contains survives without the /api/ prefix.
        assert_eq!(find("/v2/users").unwrap().id, "contains");
        assert!(find("/nothing").is_none());
    }

    #[test]
    fn test_unknown_url_match_falls_back_to_contains() {
        let index = RuntimeIndex::new();
        index
            .add(mapping(json!({
                "id": "m",
                "request": { "method": "GET", "urlPattern": "users", "urlMatch": "glob" },
                "response": { "status": 200 }
            })))
            .unwrap();

        let req = IncomingRequest {
            method: "GET".to_string(),
            url: "/api/users/7".to_string(),
            ..Default::default()
        };
        assert_eq!(index.find_best_match(&req).unwrap().id, "m");
    }

    #[test]
    fn test_query_value_among_repeated_values() {
        let index = RuntimeIndex::new();
        index
            .add(mapping(json!({
                "id": "m",
                "request": {
                    "method": "GET",
                    "urlPattern": "/search",
                    "queryParams": { "tag": "b" }
                },
                "response": { "status": 200 }
            })))
            .unwrap();

        let mut query: HashMap<String, Vec<String>> = HashMap::new();
        query.insert("tag".to_string(), vec!["a".to_string(), "b".to_string()]);
        let req = IncomingRequest {
            method: "GET".to_string(),
            url: "/search".to_string(),
            query,
            body: None,
        };
        assert_eq!(index.find_best_match(&req).unwrap().id, "m");

        let mut query: HashMap<String, Vec<String>> = HashMap::new();
        query.insert("tag".to_string(), vec!["a".to_string()]);
        let req = IncomingRequest {
            method: "GET".to_string(),
            url: "/search".to_string(),
            query,
            body: None,
        };
        assert!(index.find_best_match(&req).is_none());
    }

    #[test]
    fn test_body_constraint_requires_body() {
        let index = RuntimeIndex::new();
        index
            .add(mapping(json!({
                "id": "m",
                "request": {
                    "method": "POST",
                    "urlPattern": "/orders",
                    "body": { "orderType": "ALL" }
                },
                "response": { "status": 200 }
            })))
            .unwrap();

        assert!(index
            .find_best_match(&post_request("/orders", &[], None))
            .is_none());
        assert!(index
            .find_best_match(&post_request("/orders", &[], Some(json!({"orderType": "SOME"}))))
            .is_none());
        assert_eq!(
            index
                .find_best_match(&post_request(
                    "/orders",
                    &[],
                    Some(json!({"orderType": "ALL"}))
                ))
                .unwrap()
                .id,
            "m"
        );
    }

    #[test]
    fn test_nested_body_path() {
        let index = RuntimeIndex::new();
        index
            .add(mapping(json!({
                "id": "m",
                "request": {
                    "method": "POST",
                    "urlPattern": "/signup",
                    "body": { "customer.email": "a@b.c", "customer.age": 30 }
                },
                "response": { "status": 200 }
            })))
            .unwrap();

        let body = json!({"customer": {"email": "a@b.c", "age": 30}});
        assert_eq!(
            index
                .find_best_match(&post_request("/signup", &[], Some(body)))
                .unwrap()
                .id,
            "m"
        );

        let body = json!({"customer": {"email": "a@b.c"}});
        assert!(index
            .find_best_match(&post_request("/signup", &[], Some(body)))
            .is_none());
    }

    #[test]
    fn test_identical_shapes_share_nodes() {
        let index = RuntimeIndex::new();
        // Same predicate content, declared in different key order.
        index
            .add(mapping(json!({
                "id": "a",
                "request": {
                    "method": "GET",
                    "urlPattern": "/p",
                    "queryParams": { "x": "1", "y": "2" },
                    "body": { "k1": "v1", "k2": "v2" }
                },
                "response": { "status": 200 }
            })))
            .unwrap();
        index
            .add(mapping(json!({
                "id": "b",
                "request": {
                    "method": "GET",
                    "urlPattern": "/p",
                    "queryParams": { "y": "2", "x": "1" },
                    "body": { "k2": "v2", "k1": "v1" }
                },
                "response": { "status": 200 }
            })))
            .unwrap();

        let stats = index.stats();
        assert_eq!(stats.methods, 1);
        assert_eq!(stats.url_nodes, 1);
        assert_eq!(stats.query_nodes, 1);
        assert_eq!(stats.body_nodes, 1);
        assert_eq!(stats.stubs, 2);
    }

    #[test]
    fn test_reset_clears_everything() {
        let index = RuntimeIndex::new();
        index
            .add(mapping(json!({
                "id": "m",
                "request": { "method": "GET", "urlPattern": "/x" },
                "response": { "status": 200 }
            })))
            .unwrap();
        assert_eq!(index.count(), 1);

        index.reset();
        assert_eq!(index.count(), 0);
        let req = IncomingRequest {
            method: "GET".to_string(),
            url: "/x".to_string(),
            ..Default::default()
        };
        assert!(index.find_best_match(&req).is_none());

        // Order restarts after reset; first add wins ties again.
        index
            .add(mapping(json!({
                "id": "fresh",
                "request": { "method": "GET", "urlPattern": "/x" },
                "response": { "status": 200 }
            })))
            .unwrap();
        assert_eq!(index.find_best_match(&req).unwrap().id, "fresh");
    }
}
