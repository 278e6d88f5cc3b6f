//! The extractor itself: raw record → normalized entity.

use std::collections::HashSet;

use crate::models::{
    Entity, EntityKind, Group, Mitigation, Tactic, Technique, is_valid_id, push_unique,
};
use crate::stix::{ATTACK_SOURCE_NAME, RawObject};

use super::tables::{ExtractionTables, canonical_id_in};
use super::validated::ValidatedObject;

/// Outcome of extracting one record.
#[derive(Debug, Clone)]
pub enum Extraction {
    /// A retained, normalized entity.
    Entity(Entity),
    /// Not an entity record, kind not requested, or flagged revoked.
    /// Deliberate, not an error.
    Skipped,
    /// Failed validation and was dropped; counts as a parse error.
    Dropped,
}

impl Extraction {
    pub fn into_entity(self) -> Option<Entity> {
        match self {
            Extraction::Entity(entity) => Some(entity),
            _ => None,
        }
    }
}

/// Options governing record admission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractorOptions {
    /// Keep records flagged `revoked` or `x_mitre_deprecated`.
    pub include_revoked: bool,
}

/// Intermediate shape both parsing stages converge on before kind-specific
/// derivation.
#[derive(Debug, Default)]
struct ExtractedFields {
    id: Option<String>,
    name: String,
    description: String,
    platforms: Vec<String>,
    aliases: Vec<String>,
    /// `(kill_chain_name, phase_name)` pairs.
    kill_chain_phases: Vec<(String, String)>,
}

/// Converts raw bundle records into normalized entities.
#[derive(Debug, Clone, Default)]
pub struct EntityExtractor {
    tables: ExtractionTables,
    options: ExtractorOptions,
}

impl EntityExtractor {
    pub fn new(tables: ExtractionTables) -> Self {
        Self {
            tables,
            options: ExtractorOptions::default(),
        }
    }

    pub fn with_options(tables: ExtractionTables, options: ExtractorOptions) -> Self {
        Self { tables, options }
    }

    pub fn tables(&self) -> &ExtractionTables {
        &self.tables
    }

    /// Extract one record.
    ///
    /// Unrequested kinds are skipped before any parsing runs, which keeps
    /// them out of the entity collections (and therefore out of any resolved
    /// edge). Validation failures drop the record; nothing propagates.
    pub fn extract(&self, record: &RawObject, requested: &HashSet<EntityKind>) -> Extraction {
        let Some(tag) = record.object_type() else {
            return Extraction::Skipped;
        };
        let Some(kind) = self.tables.kind_for_type(tag) else {
            return Extraction::Skipped;
        };
        if !requested.contains(&kind) {
            return Extraction::Skipped;
        }
        if !self.options.include_revoked
            && (record.bool_field("revoked") == Some(true)
                || record.bool_field("x_mitre_deprecated") == Some(true))
        {
            return Extraction::Skipped;
        }

        let fields = match self.validated_fields(record, kind) {
            Ok(fields) => fields,
            Err(_) => self.permissive_fields(record, kind),
        };

        let Some(id) = fields.id.clone() else {
            return Extraction::Dropped;
        };
        if fields.name.is_empty() || !is_valid_id(&id, kind) {
            return Extraction::Dropped;
        }

        Extraction::Entity(self.derive(kind, id, fields))
    }

    /// Strict stage: deserialize into the typed shape. Any structural or
    /// type mismatch fails the whole parse.
    fn validated_fields(
        &self,
        record: &RawObject,
        kind: EntityKind,
    ) -> Result<ExtractedFields, serde_json::Error> {
        let parsed: ValidatedObject = serde_json::from_value(record.0.clone())?;
        let id = canonical_id_in(&parsed.external_references, kind);
        Ok(ExtractedFields {
            id,
            name: parsed.name,
            description: parsed.description.unwrap_or_default(),
            platforms: parsed.x_mitre_platforms.unwrap_or_default(),
            aliases: parsed.aliases.unwrap_or_default(),
            kill_chain_phases: parsed
                .kill_chain_phases
                .unwrap_or_default()
                .into_iter()
                .map(|p| (p.kill_chain_name, p.phase_name))
                .collect(),
        })
    }

    /// Fallback stage: direct field reads with defensive defaults. Reaches
    /// the same shape as the strict stage; records it cannot salvage end up
    /// with an empty name or no id and are dropped by the caller.
    fn permissive_fields(&self, record: &RawObject, kind: EntityKind) -> ExtractedFields {
        let kill_chain_phases = record
            .0
            .get("kill_chain_phases")
            .and_then(serde_json::Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let chain = item.get("kill_chain_name")?.as_str()?;
                        let phase = item.get("phase_name")?.as_str()?;
                        Some((chain.to_string(), phase.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        ExtractedFields {
            id: canonical_id_in(&record.external_references(), kind),
            name: record.str_field("name").unwrap_or_default().to_string(),
            description: record
                .str_field("description")
                .unwrap_or_default()
                .to_string(),
            platforms: record.str_list("x_mitre_platforms"),
            aliases: record.str_list("aliases"),
            kill_chain_phases,
        }
    }

    /// Kind-specific derivation on the converged field shape.
    fn derive(&self, kind: EntityKind, id: String, fields: ExtractedFields) -> Entity {
        match kind {
            EntityKind::Tactic => Entity::Tactic(Tactic {
                id,
                name: fields.name,
                description: fields.description,
            }),
            EntityKind::Technique => {
                let mut tactics = Vec::new();
                for (chain, phase) in &fields.kill_chain_phases {
                    if chain != ATTACK_SOURCE_NAME {
                        continue;
                    }
                    if let Some(tactic_id) = self.tables.tactic_for_phase(phase) {
                        push_unique(&mut tactics, tactic_id);
                    }
                }
                Entity::Technique(Technique {
                    id,
                    name: fields.name,
                    description: fields.description,
                    platforms: fields.platforms,
                    tactics,
                    mitigations: Vec::new(),
                    relationship_meta: Default::default(),
                })
            }
            EntityKind::Group => {
                let mut aliases = Vec::new();
                for alias in &fields.aliases {
                    if alias != &fields.name {
                        push_unique(&mut aliases, alias);
                    }
                }
                Entity::Group(Group {
                    id,
                    name: fields.name,
                    description: fields.description,
                    aliases,
                    techniques: Vec::new(),
                    relationship_meta: Default::default(),
                })
            }
            EntityKind::Mitigation => Entity::Mitigation(Mitigation {
                id,
                name: fields.name,
                description: fields.description,
                techniques: Vec::new(),
                relationship_meta: Default::default(),
            }),
        }
    }
}
