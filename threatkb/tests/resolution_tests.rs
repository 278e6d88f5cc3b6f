//! External tests for relationship resolution.
//!
//! Covers the two-phase index/resolve algorithm: edge mirroring for "uses"
//! and "mitigates", idempotence under duplicate relationship records, the
//! validated/fallback edge parse, and the skip rules that keep foreign-kind
//! identifiers out of entity lists.

use serde_json::json;
use std::collections::{BTreeMap, HashSet};

use threatkb::entity_extraction::{EntityExtractor, ExtractionTables};
use threatkb::models::{Entity, EntityKind};
use threatkb::relationships::{RelationshipResolver, ResolutionStats};
use threatkb::stix::RawObject;

fn group_apt1(internal: &str) -> serde_json::Value {
    json!({
        "type": "intrusion-set",
        "id": internal,
        "name": "APT1",
        "external_references": [
            {"source_name": "mitre-attack", "external_id": "G0007"}
        ]
    })
}

fn technique_t1055(internal: &str) -> serde_json::Value {
    json!({
        "type": "attack-pattern",
        "id": internal,
        "name": "Process Injection",
        "kill_chain_phases": [
            {"kill_chain_name": "mitre-attack", "phase_name": "defense-evasion"}
        ],
        "external_references": [
            {"source_name": "mitre-attack", "external_id": "T1055"}
        ]
    })
}

fn mitigation_m1040(internal: &str) -> serde_json::Value {
    json!({
        "type": "course-of-action",
        "id": internal,
        "name": "Behavior Prevention on Endpoint",
        "external_references": [
            {"source_name": "mitre-attack", "external_id": "M1040"}
        ]
    })
}

fn relationship(
    internal: &str,
    rel_type: &str,
    source_ref: &str,
    target_ref: &str,
) -> serde_json::Value {
    json!({
        "type": "relationship",
        "id": internal,
        "relationship_type": rel_type,
        "source_ref": source_ref,
        "target_ref": target_ref,
        "created": "2020-01-01T00:00:00.000Z",
        "modified": "2021-06-01T00:00:00.000Z"
    })
}

/// Extract all requested kinds and resolve the bundle's relationships.
fn resolve_bundle(
    records: Vec<serde_json::Value>,
    requested: &[EntityKind],
) -> (
    BTreeMap<EntityKind, Vec<Entity>>,
    Vec<threatkb::models::RelationshipRecord>,
    ResolutionStats,
) {
    let objects: Vec<RawObject> = records.into_iter().map(RawObject::from).collect();
    let requested: HashSet<EntityKind> = requested.iter().copied().collect();

    let extractor = EntityExtractor::new(ExtractionTables::attack());
    let mut entities: BTreeMap<EntityKind, Vec<Entity>> = BTreeMap::new();
    for object in &objects {
        if let Some(entity) = extractor.extract(object, &requested).into_entity() {
            entities.entry(entity.kind()).or_default().push(entity);
        }
    }

    let resolver = RelationshipResolver::new(ExtractionTables::attack());
    let (relationships, stats) = resolver.resolve(&objects, &mut entities);
    (entities, relationships, stats)
}

fn find<'a>(entities: &'a BTreeMap<EntityKind, Vec<Entity>>, id: &str) -> &'a Entity {
    entities
        .values()
        .flat_map(|list| list.iter())
        .find(|e| e.id() == id)
        .unwrap_or_else(|| panic!("entity {id} not found"))
}

#[cfg(test)]
mod uses_tests {
    use super::*;

    #[test]
    fn group_uses_technique_is_mirrored() {
        let (entities, relationships, stats) = resolve_bundle(
            vec![
                group_apt1("intrusion-set--1"),
                technique_t1055("attack-pattern--1"),
                relationship(
                    "relationship--1",
                    "uses",
                    "intrusion-set--1",
                    "attack-pattern--1",
                ),
            ],
            &EntityKind::ALL,
        );

        let group = find(&entities, "G0007").as_group().unwrap();
        assert_eq!(group.techniques, vec!["T1055"]);

        let technique = find(&entities, "T1055").as_technique().unwrap();
        assert_eq!(technique.tactics, vec!["TA0005"]);

        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0].relationship_type, "uses");
        assert_eq!(relationships[0].source_id, "G0007");
        assert_eq!(relationships[0].target_id, "T1055");
        assert_eq!(relationships[0].source_ref, "intrusion-set--1");
        assert_eq!(relationships[0].target_ref, "attack-pattern--1");
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.skipped, 0);
    }

    #[test]
    fn duplicate_uses_records_apply_exactly_once() {
        let (entities, relationships, stats) = resolve_bundle(
            vec![
                group_apt1("intrusion-set--1"),
                technique_t1055("attack-pattern--1"),
                relationship(
                    "relationship--1",
                    "uses",
                    "intrusion-set--1",
                    "attack-pattern--1",
                ),
                relationship(
                    "relationship--2",
                    "uses",
                    "intrusion-set--1",
                    "attack-pattern--1",
                ),
            ],
            &EntityKind::ALL,
        );

        let group = find(&entities, "G0007").as_group().unwrap();
        assert_eq!(group.techniques, vec!["T1055"]);
        assert_eq!(relationships.len(), 1);
        // both records resolved, the second folded into the first
        assert_eq!(stats.processed, 2);
    }

    #[test]
    fn uses_metadata_lands_on_the_group() {
        let (entities, _, _) = resolve_bundle(
            vec![
                group_apt1("intrusion-set--1"),
                technique_t1055("attack-pattern--1"),
                relationship(
                    "relationship--1",
                    "uses",
                    "intrusion-set--1",
                    "attack-pattern--1",
                ),
            ],
            &EntityKind::ALL,
        );

        let group = find(&entities, "G0007").as_group().unwrap();
        let meta = group.relationship_meta.get("T1055").unwrap();
        assert_eq!(meta.relationship_type, "uses");
        assert!(meta.created.is_some());
        assert!(meta.modified.is_some());
    }
}

#[cfg(test)]
mod mitigates_tests {
    use super::*;

    #[test]
    fn mitigates_mirrors_both_ways() {
        let (entities, relationships, _) = resolve_bundle(
            vec![
                technique_t1055("attack-pattern--1"),
                mitigation_m1040("course-of-action--1"),
                relationship(
                    "relationship--1",
                    "mitigates",
                    "course-of-action--1",
                    "attack-pattern--1",
                ),
            ],
            &EntityKind::ALL,
        );

        let technique = find(&entities, "T1055").as_technique().unwrap();
        let mitigation = find(&entities, "M1040").as_mitigation().unwrap();
        assert_eq!(technique.mitigations, vec!["M1040"]);
        assert_eq!(mitigation.techniques, vec!["T1055"]);
        assert!(technique.relationship_meta.contains_key("M1040"));
        assert!(mitigation.relationship_meta.contains_key("T1055"));
        assert_eq!(relationships.len(), 1);
    }

    #[test]
    fn duplicate_mitigates_records_are_idempotent() {
        let (entities, relationships, _) = resolve_bundle(
            vec![
                technique_t1055("attack-pattern--1"),
                mitigation_m1040("course-of-action--1"),
                relationship(
                    "relationship--1",
                    "mitigates",
                    "course-of-action--1",
                    "attack-pattern--1",
                ),
                relationship(
                    "relationship--2",
                    "mitigates",
                    "course-of-action--1",
                    "attack-pattern--1",
                ),
            ],
            &EntityKind::ALL,
        );

        let technique = find(&entities, "T1055").as_technique().unwrap();
        let mitigation = find(&entities, "M1040").as_mitigation().unwrap();
        assert_eq!(technique.mitigations, vec!["M1040"]);
        assert_eq!(mitigation.techniques, vec!["T1055"]);
        assert_eq!(relationships.len(), 1);
    }
}

#[cfg(test)]
mod skip_tests {
    use super::*;

    #[test]
    fn software_target_never_reaches_a_group() {
        // the historical bug: a "uses" edge pointing at a software record
        // must not contaminate the group's technique list
        let software = json!({
            "type": "malware",
            "id": "malware--1",
            "name": "PlugX",
            "external_references": [
                {"source_name": "mitre-attack", "external_id": "S0013"}
            ]
        });
        let (entities, relationships, stats) = resolve_bundle(
            vec![
                group_apt1("intrusion-set--1"),
                software,
                relationship("relationship--1", "uses", "intrusion-set--1", "malware--1"),
            ],
            &EntityKind::ALL,
        );

        let group = find(&entities, "G0007").as_group().unwrap();
        assert!(group.techniques.is_empty());
        assert!(relationships.is_empty());
        assert_eq!(stats.processed, 0);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn edges_to_unrequested_kinds_are_skipped() {
        // the mitigation record resolves in the index, but its kind was
        // never extracted, so the edge has an unretained endpoint
        let (entities, relationships, stats) = resolve_bundle(
            vec![
                technique_t1055("attack-pattern--1"),
                mitigation_m1040("course-of-action--1"),
                relationship(
                    "relationship--1",
                    "mitigates",
                    "course-of-action--1",
                    "attack-pattern--1",
                ),
            ],
            &[EntityKind::Technique, EntityKind::Group],
        );

        let technique = find(&entities, "T1055").as_technique().unwrap();
        assert!(technique.mitigations.is_empty());
        assert!(relationships.is_empty());
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn unresolved_refs_are_skipped_silently() {
        let (_, relationships, stats) = resolve_bundle(
            vec![
                group_apt1("intrusion-set--1"),
                relationship(
                    "relationship--1",
                    "uses",
                    "intrusion-set--1",
                    "attack-pattern--missing",
                ),
            ],
            &EntityKind::ALL,
        );

        assert!(relationships.is_empty());
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.parse_errors, 0);
    }

    #[test]
    fn malformed_relationship_counts_as_parse_error() {
        let broken = json!({
            "type": "relationship",
            "id": "relationship--1",
            "relationship_type": "uses",
            "source_ref": "intrusion-set--1"
            // no target_ref: even the fallback cannot parse this
        });
        let (_, relationships, stats) = resolve_bundle(
            vec![group_apt1("intrusion-set--1"), broken],
            &EntityKind::ALL,
        );

        assert!(relationships.is_empty());
        assert_eq!(stats.parse_errors, 1);
        assert_eq!(stats.skipped, 0);
    }
}

#[cfg(test)]
mod edge_parse_tests {
    use super::*;

    #[test]
    fn fallback_parse_recovers_edges_without_timestamps() {
        let bare = json!({
            "type": "relationship",
            "id": "relationship--1",
            "relationship_type": "uses",
            "source_ref": "intrusion-set--1",
            "target_ref": "attack-pattern--1"
        });
        let (entities, relationships, stats) = resolve_bundle(
            vec![
                group_apt1("intrusion-set--1"),
                technique_t1055("attack-pattern--1"),
                bare,
            ],
            &EntityKind::ALL,
        );

        let group = find(&entities, "G0007").as_group().unwrap();
        assert_eq!(group.techniques, vec!["T1055"]);

        assert_eq!(relationships.len(), 1);
        let record = &relationships[0];
        assert_eq!(record.relationship_type, "uses");
        assert_eq!(record.source_id, "G0007");
        assert_eq!(record.target_id, "T1055");
        assert!(record.created.is_none());
        assert!(record.modified.is_none());
        assert_eq!(stats.parse_errors, 0);
    }

    #[test]
    fn other_relationship_types_are_recorded_but_not_mirrored() {
        let sub = json!({
            "type": "attack-pattern",
            "id": "attack-pattern--2",
            "name": "Process Hollowing",
            "external_references": [
                {"source_name": "mitre-attack", "external_id": "T1055.012"}
            ]
        });
        let (entities, relationships, _) = resolve_bundle(
            vec![
                technique_t1055("attack-pattern--1"),
                sub,
                relationship(
                    "relationship--1",
                    "subtechnique-of",
                    "attack-pattern--2",
                    "attack-pattern--1",
                ),
            ],
            &EntityKind::ALL,
        );

        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0].relationship_type, "subtechnique-of");
        assert_eq!(relationships[0].source_id, "T1055.012");
        assert_eq!(relationships[0].target_id, "T1055");

        // no entity list was touched
        for entity in entities.values().flatten() {
            if let Some(t) = entity.as_technique() {
                assert!(t.mitigations.is_empty());
                assert!(t.relationship_meta.is_empty());
            }
        }
    }

    #[test]
    fn confidence_is_carried_when_present() {
        let mut edge = relationship(
            "relationship--1",
            "uses",
            "intrusion-set--1",
            "attack-pattern--1",
        );
        edge["confidence"] = json!(85);
        let (entities, relationships, _) = resolve_bundle(
            vec![
                group_apt1("intrusion-set--1"),
                technique_t1055("attack-pattern--1"),
                edge,
            ],
            &EntityKind::ALL,
        );

        assert_eq!(relationships[0].confidence, Some(85));
        let group = find(&entities, "G0007").as_group().unwrap();
        assert_eq!(
            group.relationship_meta.get("T1055").unwrap().confidence,
            Some(85)
        );
    }
}
