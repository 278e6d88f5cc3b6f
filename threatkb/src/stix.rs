//! Raw bundle model: the shape of records as they arrive off the wire.
//!
//! A bundle is a JSON document with a top-level `objects` array of
//! heterogeneous typed records. Records stay opaque ([`RawObject`] wraps the
//! raw JSON) until extraction; the accessors here are defensive, so an
//! absent or mis-typed property reads as `None`/empty rather than failing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Source label of the canonical authority in `external_references`, and the
/// kill-chain name recognized on technique records.
pub const ATTACK_SOURCE_NAME: &str = "mitre-attack";

/// Type tag of tactic records.
pub const TYPE_TACTIC: &str = "x-mitre-tactic";
/// Type tag of technique records.
pub const TYPE_TECHNIQUE: &str = "attack-pattern";
/// Type tag of group records.
pub const TYPE_GROUP: &str = "intrusion-set";
/// Type tag of mitigation records.
pub const TYPE_MITIGATION: &str = "course-of-action";
/// Type tag of relationship records.
pub const TYPE_RELATIONSHIP: &str = "relationship";

/// Top-level bundle document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(default)]
    pub objects: Vec<RawObject>,
}

impl Bundle {
    pub fn new(objects: Vec<RawObject>) -> Self {
        Self { objects }
    }

    /// The relationship-typed records of this bundle, in order.
    pub fn relationship_objects(&self) -> impl Iterator<Item = &RawObject> {
        self.objects.iter().filter(|o| o.is_type(TYPE_RELATIONSHIP))
    }
}

/// One opaque record of a bundle: a `type` tag plus arbitrary properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawObject(pub Value);

impl RawObject {
    /// The record's `type` tag.
    pub fn object_type(&self) -> Option<&str> {
        self.str_field("type")
    }

    /// Bundle-local reference (`id`), e.g. `attack-pattern--<uuid>`.
    pub fn internal_ref(&self) -> Option<&str> {
        self.str_field("id")
    }

    pub fn is_type(&self, tag: &str) -> bool {
        self.object_type() == Some(tag)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn bool_field(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// A string-array property; non-string elements are skipped.
    pub fn str_list(&self, key: &str) -> Vec<String> {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// External references carried by this record; mis-shaped entries are
    /// skipped.
    pub fn external_references(&self) -> Vec<ExternalReference> {
        self.0
            .get("external_references")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| serde_json::from_value(v.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl From<Value> for RawObject {
    fn from(value: Value) -> Self {
        RawObject(value)
    }
}

/// A `{source_name, external_id}` pair used for canonical-ID lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalReference {
    pub source_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
