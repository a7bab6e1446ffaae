//! In-memory call history.
//!
//! Append-only record of every served request, matched or not. Guarded by its
//! own lock, never held together with the index lock.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One served request and which mapping (if any) produced the response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub time: DateTime<Utc>,
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub query: HashMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<serde_json::Value>,
    /// Empty when no mapping matched.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mapping_id: String,
    pub status: u16,
}

pub struct CallHistory {
    records: RwLock<Vec<CallRecord>>,
}

impl CallHistory {
    pub fn new() -> Self {
        CallHistory {
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn record(&self, record: CallRecord) {
        self.records.write().push(record);
    }

    /// Snapshot copy, safe to iterate and serialize without holding the lock.
    pub fn snapshot(&self) -> Vec<CallRecord> {
        self.records.read().clone()
    }

    pub fn clear(&self) {
        self.records.write().clear();
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CallHistory {
    fn default() -> Self {
        Self::new()
    }
}
