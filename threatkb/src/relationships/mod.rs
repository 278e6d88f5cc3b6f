//! Two-phase relationship resolution.
//!
//! Phase 1 walks the whole bundle and indexes every record's canonical id;
//! phase 2 walks the relationship-typed records and mirrors resolvable
//! "uses"/"mitigates" edges onto the extracted entities. The barrier between
//! phases is structural: the index is fully built before any edge is
//! examined.
//!
//! An edge is applied (and recorded in the flat list) only when both of its
//! endpoints resolve through the index to a retained entity. Foreign-kind
//! records never make it into the index, so an edge pointing at one (a
//! group "using" a piece of software, say) is dropped rather than letting a
//! foreign id leak into an entity's technique list.

mod index;

pub use index::IdIndex;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::entity_extraction::ExtractionTables;
use crate::models::{
    Entity, EntityKind, RelationshipMeta, RelationshipRecord, push_unique,
};
use crate::stix::{RawObject, TYPE_RELATIONSHIP};

/// Relationship type mirrored onto groups.
pub const REL_USES: &str = "uses";
/// Relationship type mirrored onto techniques and mitigations.
pub const REL_MITIGATES: &str = "mitigates";

/// Outcome counters for one resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    /// Edges with both endpoints resolved to retained entities.
    pub processed: usize,
    /// Edges skipped for unresolved or unretained endpoints (not errors).
    pub skipped: usize,
    /// Relationship records that failed both parsing stages.
    pub parse_errors: usize,
}

/// A relationship record as validated parsing expects it: type, both refs,
/// the record id, and both timestamps must all be present and well-formed.
#[derive(Debug, Deserialize)]
struct ValidatedRelationship {
    #[serde(rename = "id")]
    _id: String,
    relationship_type: String,
    source_ref: String,
    target_ref: String,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
    #[serde(default)]
    confidence: Option<i64>,
}

/// Converged output of the validated/fallback edge parse.
#[derive(Debug)]
struct EdgeFields {
    relationship_type: String,
    source_ref: String,
    target_ref: String,
    created: Option<DateTime<Utc>>,
    modified: Option<DateTime<Utc>>,
    confidence: Option<i64>,
}

impl EdgeFields {
    fn meta(&self) -> RelationshipMeta {
        RelationshipMeta {
            relationship_type: self.relationship_type.clone(),
            created: self.created,
            modified: self.modified,
            confidence: self.confidence,
        }
    }
}

/// Resolves relationship records against extracted entities.
#[derive(Debug, Clone, Default)]
pub struct RelationshipResolver {
    tables: ExtractionTables,
}

impl RelationshipResolver {
    pub fn new(tables: ExtractionTables) -> Self {
        Self { tables }
    }

    /// Resolve every relationship record in `objects` against `entities`,
    /// mutating entities in place and returning the flat edge list.
    ///
    /// Re-running over a bundle with duplicate relationship records is
    /// idempotent: entity list mutation and the flat list are both set-like.
    pub fn resolve(
        &self,
        objects: &[RawObject],
        entities: &mut BTreeMap<EntityKind, Vec<Entity>>,
    ) -> (Vec<RelationshipRecord>, ResolutionStats) {
        let index = IdIndex::build(&self.tables, objects);

        // Positions of retained entities by canonical id.
        let mut positions: HashMap<String, (EntityKind, usize)> = HashMap::new();
        for (kind, list) in entities.iter() {
            for (i, entity) in list.iter().enumerate() {
                positions.insert(entity.id().to_string(), (*kind, i));
            }
        }

        let mut stats = ResolutionStats::default();
        let mut records: Vec<RelationshipRecord> = Vec::new();
        let mut seen: HashSet<(String, String, String)> = HashSet::new();

        for object in objects.iter().filter(|o| o.is_type(TYPE_RELATIONSHIP)) {
            let Some(edge) = parse_edge(object) else {
                stats.parse_errors += 1;
                continue;
            };
            let (Some(source_id), Some(target_id)) = (
                index.resolve(&edge.source_ref),
                index.resolve(&edge.target_ref),
            ) else {
                stats.skipped += 1;
                continue;
            };
            let (Some(&(source_kind, _)), Some(&(target_kind, _))) =
                (positions.get(source_id), positions.get(target_id))
            else {
                stats.skipped += 1;
                continue;
            };
            let source_id = source_id.to_string();
            let target_id = target_id.to_string();

            match edge.relationship_type.as_str() {
                REL_USES
                    if source_kind == EntityKind::Group
                        && target_kind == EntityKind::Technique =>
                {
                    apply_uses(entities, &positions, &edge, &source_id, &target_id);
                }
                REL_MITIGATES
                    if source_kind == EntityKind::Mitigation
                        && target_kind == EntityKind::Technique =>
                {
                    apply_mitigates(entities, &positions, &edge, &source_id, &target_id);
                }
                // any other type: recorded, never mirrored
                _ => {}
            }

            stats.processed += 1;
            let key = (
                edge.relationship_type.clone(),
                source_id.clone(),
                target_id.clone(),
            );
            if seen.insert(key) {
                records.push(RelationshipRecord {
                    relationship_type: edge.relationship_type,
                    source_id,
                    target_id,
                    source_ref: edge.source_ref,
                    target_ref: edge.target_ref,
                    created: edge.created,
                    modified: edge.modified,
                    confidence: edge.confidence,
                });
            }
        }

        (records, stats)
    }
}

/// Validated parse, else fallback to direct reads of the type and both refs
/// only. `None` when even the fallback cannot produce those three.
fn parse_edge(object: &RawObject) -> Option<EdgeFields> {
    if let Ok(parsed) = serde_json::from_value::<ValidatedRelationship>(object.0.clone()) {
        return Some(EdgeFields {
            relationship_type: parsed.relationship_type,
            source_ref: parsed.source_ref,
            target_ref: parsed.target_ref,
            created: Some(parsed.created),
            modified: Some(parsed.modified),
            confidence: parsed.confidence,
        });
    }

    Some(EdgeFields {
        relationship_type: object.str_field("relationship_type")?.to_string(),
        source_ref: object.str_field("source_ref")?.to_string(),
        target_ref: object.str_field("target_ref")?.to_string(),
        created: None,
        modified: None,
        confidence: None,
    })
}

fn entity_at<'e>(
    entities: &'e mut BTreeMap<EntityKind, Vec<Entity>>,
    positions: &HashMap<String, (EntityKind, usize)>,
    id: &str,
) -> Option<&'e mut Entity> {
    let (kind, i) = positions.get(id)?;
    entities.get_mut(kind)?.get_mut(*i)
}

fn apply_uses(
    entities: &mut BTreeMap<EntityKind, Vec<Entity>>,
    positions: &HashMap<String, (EntityKind, usize)>,
    edge: &EdgeFields,
    group_id: &str,
    technique_id: &str,
) {
    if let Some(group) = entity_at(entities, positions, group_id).and_then(Entity::as_group_mut) {
        push_unique(&mut group.techniques, technique_id);
        group
            .relationship_meta
            .insert(technique_id.to_string(), edge.meta());
    }
}

fn apply_mitigates(
    entities: &mut BTreeMap<EntityKind, Vec<Entity>>,
    positions: &HashMap<String, (EntityKind, usize)>,
    edge: &EdgeFields,
    mitigation_id: &str,
    technique_id: &str,
) {
    if let Some(technique) =
        entity_at(entities, positions, technique_id).and_then(Entity::as_technique_mut)
    {
        push_unique(&mut technique.mitigations, mitigation_id);
        technique
            .relationship_meta
            .insert(mitigation_id.to_string(), edge.meta());
    }
    if let Some(mitigation) =
        entity_at(entities, positions, mitigation_id).and_then(Entity::as_mitigation_mut)
    {
        push_unique(&mut mitigation.techniques, technique_id);
        mitigation
            .relationship_meta
            .insert(technique_id.to_string(), edge.meta());
    }
}
