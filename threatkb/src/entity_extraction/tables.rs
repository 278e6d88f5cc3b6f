//! Immutable lookup tables injected into the extractor and resolver.

use std::collections::HashMap;

use crate::models::{EntityKind, is_valid_id};
use crate::stix::{ATTACK_SOURCE_NAME, ExternalReference, RawObject};
use crate::stix::{TYPE_GROUP, TYPE_MITIGATION, TYPE_TACTIC, TYPE_TECHNIQUE};

use super::phases::PHASE_TACTICS;

/// Type-tag and kill-chain-phase lookup tables, built once and owned by the
/// pipeline objects that need them.
#[derive(Debug, Clone)]
pub struct ExtractionTables {
    type_map: HashMap<&'static str, EntityKind>,
    phase_map: HashMap<&'static str, &'static str>,
}

impl ExtractionTables {
    /// Tables for the ATT&CK family of bundles.
    pub fn attack() -> Self {
        let type_map = HashMap::from([
            (TYPE_TACTIC, EntityKind::Tactic),
            (TYPE_TECHNIQUE, EntityKind::Technique),
            (TYPE_GROUP, EntityKind::Group),
            (TYPE_MITIGATION, EntityKind::Mitigation),
        ]);
        let phase_map = PHASE_TACTICS.iter().copied().collect();
        Self { type_map, phase_map }
    }

    /// Map a record's type tag to an entity kind; unknown tags (software,
    /// campaigns, data sources) have no kind.
    pub fn kind_for_type(&self, tag: &str) -> Option<EntityKind> {
        self.type_map.get(tag).copied()
    }

    /// Map a kill-chain phase name to a tactic id.
    pub fn tactic_for_phase(&self, phase: &str) -> Option<&'static str> {
        self.phase_map.get(phase).copied()
    }

    /// Canonical id for a record, when it carries one: the type tag must map
    /// to a kind, and an external reference from the canonical authority must
    /// hold an id valid for that kind. First valid match wins.
    pub fn canonical_id(&self, record: &RawObject) -> Option<String> {
        let kind = self.kind_for_type(record.object_type()?)?;
        canonical_id_in(&record.external_references(), kind)
    }
}

impl Default for ExtractionTables {
    fn default() -> Self {
        Self::attack()
    }
}

/// First id in `refs` that comes from the canonical authority and validates
/// for `kind`; later entries are ignored.
pub(crate) fn canonical_id_in(refs: &[ExternalReference], kind: EntityKind) -> Option<String> {
    refs.iter()
        .filter(|r| r.source_name == ATTACK_SOURCE_NAME)
        .filter_map(|r| r.external_id.as_deref())
        .find(|id| is_valid_id(id, kind))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_map_covers_the_four_kinds_only() {
        let tables = ExtractionTables::attack();
        assert_eq!(tables.kind_for_type("x-mitre-tactic"), Some(EntityKind::Tactic));
        assert_eq!(tables.kind_for_type("attack-pattern"), Some(EntityKind::Technique));
        assert_eq!(tables.kind_for_type("intrusion-set"), Some(EntityKind::Group));
        assert_eq!(tables.kind_for_type("course-of-action"), Some(EntityKind::Mitigation));
        assert_eq!(tables.kind_for_type("malware"), None);
        assert_eq!(tables.kind_for_type("tool"), None);
        assert_eq!(tables.kind_for_type("relationship"), None);
    }

    #[test]
    fn phase_map_matches_the_kill_chain() {
        let tables = ExtractionTables::attack();
        assert_eq!(tables.tactic_for_phase("initial-access"), Some("TA0001"));
        assert_eq!(tables.tactic_for_phase("defense-evasion"), Some("TA0005"));
        assert_eq!(tables.tactic_for_phase("command-and-control"), Some("TA0011"));
        assert_eq!(tables.tactic_for_phase("impact"), Some("TA0040"));
        assert_eq!(tables.tactic_for_phase("reconnaissance"), None);
        assert_eq!(tables.tactic_for_phase(""), None);
    }

    #[test]
    fn canonical_id_requires_authority_source_and_valid_shape() {
        let refs = vec![
            ExternalReference {
                source_name: "capec".into(),
                external_id: Some("CAPEC-640".into()),
                url: None,
            },
            ExternalReference {
                source_name: "mitre-attack".into(),
                external_id: Some("T1055".into()),
                url: None,
            },
        ];
        assert_eq!(
            canonical_id_in(&refs, EntityKind::Technique),
            Some("T1055".to_string())
        );
        // the same references hold no valid group id
        assert_eq!(canonical_id_in(&refs, EntityKind::Group), None);
    }

    #[test]
    fn canonical_id_ignores_records_of_foreign_type() {
        let tables = ExtractionTables::attack();
        let software = RawObject::from(json!({
            "type": "malware",
            "id": "malware--0001",
            "external_references": [
                {"source_name": "mitre-attack", "external_id": "S0154"}
            ]
        }));
        assert_eq!(tables.canonical_id(&software), None);
    }
}
