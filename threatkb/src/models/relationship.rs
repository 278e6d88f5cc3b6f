//! Flat relationship records produced by edge resolution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One resolved edge between two canonical ids.
///
/// Both the canonical endpoints and the bundle-local references are kept:
/// the former for lookups, the latter for tracing an edge back to the raw
/// records it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    /// Edge type: "uses", "mitigates", or any other type found in the bundle.
    pub relationship_type: String,
    pub source_id: String,
    pub target_id: String,
    pub source_ref: String,
    pub target_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<i64>,
}
