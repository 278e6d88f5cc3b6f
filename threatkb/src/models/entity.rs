//! Normalized entity structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ids::EntityKind;

/// Per-edge relationship metadata attached to an entity, keyed by peer id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipMeta {
    /// The relationship type that produced this edge ("uses", "mitigates").
    pub relationship_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<i64>,
}

/// A tactic: one stage of the kill chain (`TA0005` "Defense Evasion").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tactic {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// A technique or sub-technique (`T1055`, `T1055.012`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technique {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Platforms the technique applies to, passed through from the record.
    pub platforms: Vec<String>,
    /// Tactic ids derived from recognized kill-chain phases.
    pub tactics: Vec<String>,
    /// Mitigation ids mirrored from resolved `mitigates` edges.
    pub mitigations: Vec<String>,
    /// Edge metadata keyed by peer id.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub relationship_meta: HashMap<String, RelationshipMeta>,
}

/// An adversary group (`G0016`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Alternative names; never contains `name` itself.
    pub aliases: Vec<String>,
    /// Technique ids resolved from `uses` edges.
    pub techniques: Vec<String>,
    /// Edge metadata keyed by peer id.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub relationship_meta: HashMap<String, RelationshipMeta>,
}

/// A mitigation / course of action (`M1040`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mitigation {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Technique ids resolved from `mitigates` edges.
    pub techniques: Vec<String>,
    /// Edge metadata keyed by peer id.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub relationship_meta: HashMap<String, RelationshipMeta>,
}

/// A normalized entity of any kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Tactic(Tactic),
    Technique(Technique),
    Group(Group),
    Mitigation(Mitigation),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Tactic(_) => EntityKind::Tactic,
            Entity::Technique(_) => EntityKind::Technique,
            Entity::Group(_) => EntityKind::Group,
            Entity::Mitigation(_) => EntityKind::Mitigation,
        }
    }

    /// Canonical public identifier.
    pub fn id(&self) -> &str {
        match self {
            Entity::Tactic(t) => &t.id,
            Entity::Technique(t) => &t.id,
            Entity::Group(g) => &g.id,
            Entity::Mitigation(m) => &m.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entity::Tactic(t) => &t.name,
            Entity::Technique(t) => &t.name,
            Entity::Group(g) => &g.name,
            Entity::Mitigation(m) => &m.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Entity::Tactic(t) => &t.description,
            Entity::Technique(t) => &t.description,
            Entity::Group(g) => &g.description,
            Entity::Mitigation(m) => &m.description,
        }
    }

    pub fn as_technique(&self) -> Option<&Technique> {
        match self {
            Entity::Technique(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Entity::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_mitigation(&self) -> Option<&Mitigation> {
        match self {
            Entity::Mitigation(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_technique_mut(&mut self) -> Option<&mut Technique> {
        match self {
            Entity::Technique(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut Group> {
        match self {
            Entity::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_mitigation_mut(&mut self) -> Option<&mut Mitigation> {
        match self {
            Entity::Mitigation(m) => Some(m),
            _ => None,
        }
    }
}

/// Append `value` unless already present, preserving insertion order.
pub(crate) fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}
