//! The parsed, queryable dataset produced by one bundle load.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::entity::Entity;
use super::ids::EntityKind;
use super::relationship::RelationshipRecord;

/// Aggregate counters for one load. Per-record failures never propagate;
/// they only show up here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    /// Raw objects seen in the bundle.
    pub objects_processed: usize,
    /// Entities that survived extraction.
    pub entities_extracted: usize,
    /// Records dropped by validated and fallback parsing combined.
    pub parse_errors: usize,
    /// Relationship edges resolved (any type, duplicates included).
    pub relationships_processed: usize,
    /// Relationship edges skipped for unresolved or unretained endpoints.
    pub relationships_skipped: usize,
}

/// Normalized output of one bundle load: entity-kind → ordered entity list,
/// plus the flat relationship list. Cached per source name until cleared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedDataset {
    pub entities: BTreeMap<EntityKind, Vec<Entity>>,
    pub relationships: Vec<RelationshipRecord>,
    pub stats: LoadStats,
}

impl ParsedDataset {
    /// Entities of one kind, in bundle order. Empty for kinds that were
    /// never requested.
    pub fn entities_of(&self, kind: EntityKind) -> &[Entity] {
        self.entities.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Look up an entity of any kind by canonical id.
    pub fn find_entity(&self, id: &str) -> Option<&Entity> {
        self.entities
            .values()
            .flat_map(|list| list.iter())
            .find(|e| e.id() == id)
    }

    /// Look up an entity of one kind by exact name.
    pub fn find_by_name(&self, kind: EntityKind, name: &str) -> Option<&Entity> {
        self.entities_of(kind).iter().find(|e| e.name() == name)
    }

    /// Total entity count across all kinds.
    pub fn entity_count(&self) -> usize {
        self.entities.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_count() == 0 && self.relationships.is_empty()
    }
}
