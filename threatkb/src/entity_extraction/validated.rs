//! Strictly-typed record shapes for validated extraction.
//!
//! Deserializing into these shapes is the validation: a missing required
//! field or a mis-typed property fails the parse, and the caller falls back
//! to permissive field reads.

use serde::Deserialize;

use crate::stix::ExternalReference;

/// An entity record as validated extraction expects it. `name` and the
/// external-reference list are required; everything else is optional but
/// must be well-typed when present.
#[derive(Debug, Deserialize)]
pub(crate) struct ValidatedObject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub external_references: Vec<ExternalReference>,
    #[serde(default)]
    pub aliases: Option<Vec<String>>,
    #[serde(default)]
    pub x_mitre_platforms: Option<Vec<String>>,
    #[serde(default)]
    pub kill_chain_phases: Option<Vec<KillChainPhase>>,
}

/// A kill-chain phase entry on a technique record.
#[derive(Debug, Deserialize)]
pub(crate) struct KillChainPhase {
    pub kill_chain_name: String,
    pub phase_name: String,
}
