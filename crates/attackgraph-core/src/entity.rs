//! Typed entity layer over raw STIX objects.
//!
//! The graph never hands out raw objects directly; it wraps them in
//! [`Entity`], which pins down the entity kind once and exposes
//! validate-on-read accessors that default missing attributes instead of
//! failing. Entities are addressed by [`EntityIx`], a dense index into the
//! graph's entity table.

use std::str::FromStr;

use strum_macros::{Display, EnumIter, EnumString, FromRepr};

use crate::stix::{ExternalReference, StixObject};

/// Index of an entity in the graph's entity table.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default)]
pub struct EntityIx(pub u32);

impl std::fmt::Display for EntityIx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl EntityIx {
    pub fn new(ix: u32) -> Self {
        Self(ix)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Entity kinds the pipeline distinguishes. Everything else is `Unknown`
/// and still indexed; queries filter by kind where it matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, FromRepr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    Unknown,
    Technique,
    Tactic,
    Mitigation,
    Software,
    DetectionStrategy,
    Relationship,
}

impl Default for EntityKind {
    fn default() -> Self {
        EntityKind::Unknown
    }
}

impl EntityKind {
    /// Classify a STIX `type` string. Malware, tools and intrusion sets all
    /// collapse into [`EntityKind::Software`].
    pub fn from_stix_type(stix_type: &str) -> Self {
        match stix_type {
            "attack-pattern" => EntityKind::Technique,
            "x-mitre-tactic" => EntityKind::Tactic,
            "course-of-action" => EntityKind::Mitigation,
            "malware" | "tool" | "intrusion-set" => EntityKind::Software,
            "x-mitre-detection-strategy" => EntityKind::DetectionStrategy,
            "relationship" => EntityKind::Relationship,
            _ => EntityKind::Unknown,
        }
    }
}

/// Relationship kinds the pipeline resolves. Display and parse forms match
/// the STIX `relationship_type` wire strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, FromRepr, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum RelationKind {
    Unknown,
    Uses,
    Mitigates,
    SubtechniqueOf,
    RevokedBy,
    Detects,
}

impl Default for RelationKind {
    fn default() -> Self {
        RelationKind::Unknown
    }
}

impl RelationKind {
    /// Classify a STIX `relationship_type` string; unrecognized types map
    /// to `Unknown` rather than failing.
    pub fn from_stix_type(stix_type: &str) -> Self {
        RelationKind::from_str(stix_type).unwrap_or(RelationKind::Unknown)
    }
}

/// A graph node: one raw STIX object plus its resolved kind.
#[derive(Debug, Clone, Default)]
pub struct Entity {
    kind: EntityKind,
    raw: StixObject,
}

impl Entity {
    pub fn new(raw: StixObject) -> Self {
        let kind = EntityKind::from_stix_type(&raw.object_type);
        Self { kind, raw }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// The STIX id. May be empty for malformed input; the graph still
    /// indexes such objects under the empty key.
    pub fn id(&self) -> &str {
        &self.raw.id
    }

    /// The ATT&CK id (e.g. "T1059"), if the object has one.
    pub fn attack_id(&self) -> Option<&str> {
        self.raw.attack_id()
    }

    pub fn name(&self) -> &str {
        self.raw.name.as_deref().unwrap_or("")
    }

    pub fn description(&self) -> &str {
        self.raw.description.as_deref().unwrap_or("")
    }

    pub fn created(&self) -> &str {
        self.raw.created.as_deref().unwrap_or("")
    }

    pub fn modified(&self) -> &str {
        self.raw.modified.as_deref().unwrap_or("")
    }

    pub fn revoked(&self) -> bool {
        self.raw.revoked.unwrap_or(false)
    }

    pub fn deprecated(&self) -> bool {
        self.raw.x_mitre_deprecated.unwrap_or(false)
    }

    pub fn is_subtechnique(&self) -> bool {
        self.raw.x_mitre_is_subtechnique.unwrap_or(false)
    }

    pub fn platforms(&self) -> &[String] {
        &self.raw.x_mitre_platforms
    }

    pub fn domains(&self) -> &[String] {
        &self.raw.x_mitre_domains
    }

    pub fn version(&self) -> &str {
        self.raw.x_mitre_version.as_deref().unwrap_or("")
    }

    pub fn detection(&self) -> &str {
        self.raw.x_mitre_detection.as_deref().unwrap_or("")
    }

    pub fn attack_spec_version(&self) -> &str {
        self.raw.x_mitre_attack_spec_version.as_deref().unwrap_or("")
    }

    /// Tactic shortname (tactics only), e.g. "defense-evasion".
    pub fn shortname(&self) -> Option<&str> {
        self.raw.x_mitre_shortname.as_deref()
    }

    /// Kill-chain phase names in declaration order (techniques only).
    pub fn phase_names(&self) -> impl Iterator<Item = &str> {
        self.raw
            .kill_chain_phases
            .iter()
            .map(|p| p.phase_name.as_str())
    }

    pub fn external_references(&self) -> &[ExternalReference] {
        &self.raw.external_references
    }

    /// The underlying raw object.
    pub fn raw(&self) -> &StixObject {
        &self.raw
    }
}
