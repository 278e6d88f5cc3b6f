//! Internal-reference → canonical-id index (phase 1 of resolution).

use std::collections::HashMap;

use crate::entity_extraction::ExtractionTables;
use crate::stix::RawObject;

/// Ephemeral map from bundle-local reference to canonical id. Rebuilt for
/// every load, never cached.
#[derive(Debug, Default)]
pub struct IdIndex {
    entries: HashMap<String, String>,
}

impl IdIndex {
    /// Index every record in the bundle that carries a resolvable canonical
    /// id, requested kind or not. Records of foreign type have no kind to
    /// validate against and are never indexed, so edges referencing them
    /// cannot resolve.
    pub fn build(tables: &ExtractionTables, objects: &[RawObject]) -> Self {
        let mut entries = HashMap::new();
        for object in objects {
            let Some(internal_ref) = object.internal_ref() else {
                continue;
            };
            if let Some(canonical_id) = tables.canonical_id(object) {
                entries.insert(internal_ref.to_string(), canonical_id);
            }
        }
        Self { entries }
    }

    pub fn resolve(&self, internal_ref: &str) -> Option<&str> {
        self.entries.get(internal_ref).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn indexes_records_with_canonical_ids_only() {
        let objects = vec![
            RawObject::from(json!({
                "type": "attack-pattern",
                "id": "attack-pattern--1",
                "external_references": [
                    {"source_name": "mitre-attack", "external_id": "T1055"}
                ]
            })),
            // foreign kind: carries an id, but no kind to validate against
            RawObject::from(json!({
                "type": "malware",
                "id": "malware--1",
                "external_references": [
                    {"source_name": "mitre-attack", "external_id": "S0154"}
                ]
            })),
            // entity kind with a non-authority reference only
            RawObject::from(json!({
                "type": "attack-pattern",
                "id": "attack-pattern--2",
                "external_references": [
                    {"source_name": "capec", "external_id": "CAPEC-640"}
                ]
            })),
        ];
        let index = IdIndex::build(&ExtractionTables::attack(), &objects);
        assert_eq!(index.len(), 1);
        assert_eq!(index.resolve("attack-pattern--1"), Some("T1055"));
        assert_eq!(index.resolve("malware--1"), None);
        assert_eq!(index.resolve("attack-pattern--2"), None);
    }
}
