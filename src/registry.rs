//! Raw mapping registry for introspection.
//!
//! Keeps every accepted mapping as loaded, including disabled ones (their
//! `metadata.enabled: false` is visible in the snapshot). Independent of the
//! runtime index and guarded by its own lock.

use crate::mapping::Mapping;
use parking_lot::RwLock;

pub struct MappingRegistry {
    mappings: RwLock<Vec<Mapping>>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        MappingRegistry {
            mappings: RwLock::new(Vec::new()),
        }
    }

    pub fn register(&self, mapping: Mapping) {
        self.mappings.write().push(mapping);
    }

    /// Snapshot copy, safe to iterate and serialize without holding the lock.
    pub fn snapshot(&self) -> Vec<Mapping> {
        self.mappings.read().clone()
    }

    pub fn reset(&self) {
        self.mappings.write().clear();
    }

    pub fn len(&self) -> usize {
        self.mappings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MappingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(id: &str, enabled: Option<bool>) -> Mapping {
        let mut raw = json!({
            "id": id,
            "request": { "method": "GET", "urlPattern": "/x" },
            "response": { "status": 200 }
        });
        if let Some(enabled) = enabled {
            raw["metadata"] = json!({ "enabled": enabled });
        }
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_register_and_snapshot() {
        let registry = MappingRegistry::new();
        assert!(registry.is_empty());

        registry.register(mapping("a", None));
        registry.register(mapping("b", Some(false)));

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id, "a");
        // Disabled mappings stay visible, flag intact.
        assert_eq!(snapshot[1].metadata.enabled, Some(false));
    }

    #[test]
    fn test_reset() {
        let registry = MappingRegistry::new();
        registry.register(mapping("a", None));
        registry.reset();
        assert!(registry.is_empty());
    }
}
