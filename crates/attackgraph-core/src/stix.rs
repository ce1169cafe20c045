//! Raw STIX bundle model.
//!
//! Mirrors the subset of STIX 2.x the pipeline reads. Every field except
//! `type` and `id` is optional in the wild, so everything deserializes with
//! defaults and unknown fields are kept in an extra bag instead of being
//! rejected.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Source names whose external references carry ATT&CK ids.
pub const ATTACK_SOURCE_NAMES: [&str; 3] =
    ["mitre-attack", "mitre-mobile-attack", "mitre-ics-attack"];

/// A STIX bundle: the top-level document shape of an ATT&CK release.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StixBundle {
    #[serde(rename = "type", default)]
    pub bundle_type: String,
    #[serde(default)]
    pub id: String,
    pub objects: Vec<StixObject>,
}

impl StixBundle {
    /// Build a bundle directly from objects, for callers that assemble
    /// graphs without going through JSON.
    pub fn from_objects(objects: Vec<StixObject>) -> Self {
        Self {
            bundle_type: "bundle".to_string(),
            id: String::new(),
            objects,
        }
    }
}

/// One object out of a bundle's `objects` array.
///
/// Domain objects and relationship objects share this shape; relationship
/// fields are simply `None` on domain objects and vice versa.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StixObject {
    #[serde(rename = "type", default)]
    pub object_type: String,
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_references: Vec<ExternalReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kill_chain_phases: Vec<KillChainPhase>,

    // Relationship objects only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_ref: Option<String>,

    // ATT&CK extension fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub x_mitre_platforms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub x_mitre_domains: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_mitre_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_mitre_deprecated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_mitre_is_subtechnique: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_mitre_detection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_mitre_shortname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_mitre_attack_spec_version: Option<String>,

    /// Anything else the bundle carries (markings, custom fields).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl StixObject {
    /// The ATT&CK id of this object, read from the first external reference
    /// with a recognized source name. `None` when the object has no ATT&CK
    /// identity (markings, identities, most custom objects).
    pub fn attack_id(&self) -> Option<&str> {
        self.external_references
            .iter()
            .find(|r| ATTACK_SOURCE_NAMES.contains(&r.source_name.as_str()))
            .and_then(|r| r.external_id.as_deref())
    }
}

/// An entry of `external_references`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalReference {
    #[serde(default)]
    pub source_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// An entry of `kill_chain_phases`; `phase_name` names the tactic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillChainPhase {
    #[serde(default)]
    pub kill_chain_name: String,
    #[serde(default)]
    pub phase_name: String,
}
