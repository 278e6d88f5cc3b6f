//! Canonical identifier kinds and validation.
//!
//! Canonical ids are the stable public identifiers (`T1055`, `G0016`,
//! `TA0005`, `M1040`), distinct from the bundle-local references used to
//! link records together before resolution.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of entity the knowledge base materializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    #[serde(rename = "tactics")]
    Tactic,
    #[serde(rename = "techniques")]
    Technique,
    #[serde(rename = "groups")]
    Group,
    #[serde(rename = "mitigations")]
    Mitigation,
}

impl EntityKind {
    /// All kinds, in the order collections are reported.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Tactic,
        EntityKind::Technique,
        EntityKind::Group,
        EntityKind::Mitigation,
    ];

    /// Collection name used for configuration and dataset keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Tactic => "tactics",
            EntityKind::Technique => "techniques",
            EntityKind::Group => "groups",
            EntityKind::Mitigation => "mitigations",
        }
    }

    /// Parse a configuration name (singular or plural) into a kind.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "tactic" | "tactics" => Some(EntityKind::Tactic),
            "technique" | "techniques" => Some(EntityKind::Technique),
            "group" | "groups" => Some(EntityKind::Group),
            "mitigation" | "mitigations" => Some(EntityKind::Mitigation),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

lazy_static! {
    static ref TACTIC_ID: Regex = Regex::new(r"^TA\d{4}$").unwrap();
    static ref TECHNIQUE_ID: Regex = Regex::new(r"^T\d{4}(\.\d{3})?$").unwrap();
    static ref GROUP_ID: Regex = Regex::new(r"^G\d{4}$").unwrap();
    static ref MITIGATION_ID: Regex = Regex::new(r"^M\d{4}$").unwrap();
}

/// Check whether `id` matches the canonical shape for `kind`.
///
/// Anchored and case-sensitive: `TA0005`, `T1055`, `T1055.012`, `G0016`,
/// `M1040`. Anything else (wrong case, stray whitespace, partial match,
/// non-numeric suffix) is invalid.
pub fn is_valid_id(id: &str, kind: EntityKind) -> bool {
    match kind {
        EntityKind::Tactic => TACTIC_ID.is_match(id),
        EntityKind::Technique => TECHNIQUE_ID.is_match(id),
        EntityKind::Group => GROUP_ID.is_match(id),
        EntityKind::Mitigation => MITIGATION_ID.is_match(id),
    }
}
