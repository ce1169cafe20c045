//! Per-technique record model.
//!
//! One record aggregates everything the graph resolves for a technique:
//! tactics, data sources, mitigating controls, software and actors using
//! it, plain references, sub-techniques and the parent for sub-techniques.
//! Field order is the serialization contract. Descriptions are carried
//! as loaded; the record view never scrubs citations.

use attackgraph_core::{AttackGraph, Entity, EntityKind, ExternalReference, GraphQuery};
use attackgraph_error::{Error, Result};
use serde::Serialize;

/// Data-source descriptions are trimmed to this many characters.
const DATA_SOURCE_DESCRIPTION_LIMIT: usize = 200;

/// The full record rendered for one technique.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechniqueRecord {
    pub technique_id: String,
    pub name: String,
    pub description: String,
    pub tactics: Vec<TacticRef>,
    pub platforms: Vec<String>,
    pub data_sources: Vec<DataSourceRef>,
    pub mitigations: Vec<MitigationRef>,
    pub software: Vec<SoftwareRef>,
    pub references: Vec<Reference>,
    pub subtechniques: Vec<TechniqueSummary>,
    pub metadata: RecordMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_technique: Option<TechniqueSummary>,
}

/// A tactic resolved from a kill-chain phase. `id` is the ATT&CK id,
/// null when the tactic carries none.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TacticRef {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
}

/// A data source taken from a detection strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSourceRef {
    pub name: String,
    pub description: String,
}

/// A mitigating control. `id` is the STIX id; mitigations carry no
/// revoked flag in the record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MitigationRef {
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub deprecated: bool,
    pub domains: Vec<String>,
    pub external_references: Vec<ExternalReference>,
    pub created: String,
    pub modified: String,
}

/// A software or actor entity using the technique.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoftwareRef {
    pub id: String,
    pub external_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub software_type: String,
    pub description: String,
    pub platforms: Vec<String>,
    pub version: String,
    pub deprecated: bool,
    pub domains: Vec<String>,
    pub external_references: Vec<ExternalReference>,
    pub created: String,
    pub modified: String,
    pub revoked: bool,
}

/// A non-ATT&CK external reference off the technique itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reference {
    pub source: String,
    pub url: String,
    pub description: String,
}

/// Short form of a technique, used for sub-technique entries and the
/// parent of a sub-technique.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechniqueSummary {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub platforms: Vec<String>,
    pub tactics: Vec<TacticRef>,
}

/// Versioning and lifecycle attributes of the technique.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordMetadata {
    pub created: String,
    pub modified: String,
    pub version: String,
    pub deprecated: bool,
    pub is_subtechnique: bool,
    pub detection: String,
    pub domains: Vec<String>,
    pub attack_spec_version: String,
    pub revoked: bool,
}

/// Build the record for a technique entity.
///
/// Fails only when the technique carries no ATT&CK id, since the id names
/// the record; everything else defaults.
pub fn technique_record(graph: &AttackGraph, technique: &Entity) -> Result<TechniqueRecord> {
    let Some(attack_id) = technique.attack_id() else {
        return Err(Error::render_failed("technique has no ATT&CK id")
            .with_operation("technique_record")
            .with_context("stix_id", technique.id()));
    };
    let query = GraphQuery::new(graph);

    Ok(TechniqueRecord {
        technique_id: attack_id.to_string(),
        name: display_name(technique),
        description: technique.description().to_string(),
        tactics: resolve_tactics(&query, technique.id()),
        platforms: technique.platforms().to_vec(),
        data_sources: resolve_data_sources(&query, technique.id()),
        mitigations: resolve_mitigations(&query, technique.id()),
        software: resolve_software(&query, technique.id()),
        references: resolve_references(technique),
        subtechniques: resolve_subtechniques(&query, technique.id()),
        metadata: RecordMetadata {
            created: technique.created().to_string(),
            modified: technique.modified().to_string(),
            version: technique.version().to_string(),
            deprecated: technique.deprecated(),
            is_subtechnique: technique.is_subtechnique(),
            detection: technique.detection().to_string(),
            domains: technique.domains().to_vec(),
            attack_spec_version: technique.attack_spec_version().to_string(),
            revoked: technique.revoked(),
        },
        parent_technique: resolve_parent(&query, technique),
    })
}

/// Build the record for the technique with the given STIX id.
pub fn record_for(graph: &AttackGraph, technique_id: &str) -> Result<TechniqueRecord> {
    let Some(entity) = graph.resolve(technique_id) else {
        return Err(Error::entity_not_found(technique_id).with_operation("record_for"));
    };
    technique_record(graph, entity)
}

/// Name with the "Unknown" fallback for objects missing one entirely.
/// An explicit empty name stays empty.
fn display_name(entity: &Entity) -> String {
    entity
        .raw()
        .name
        .clone()
        .unwrap_or_else(|| "Unknown".to_string())
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

fn tactic_ref(tactic: &Entity) -> TacticRef {
    TacticRef {
        id: tactic.attack_id().map(str::to_string),
        name: tactic.name().to_string(),
        description: tactic.description().to_string(),
    }
}

fn resolve_tactics(query: &GraphQuery, technique_id: &str) -> Vec<TacticRef> {
    query
        .tactics_of(technique_id)
        .into_iter()
        .map(tactic_ref)
        .collect()
}

fn resolve_data_sources(query: &GraphQuery, technique_id: &str) -> Vec<DataSourceRef> {
    query
        .detection_strategies_for(technique_id)
        .into_iter()
        .map(|strategy| DataSourceRef {
            name: display_name(strategy),
            description: truncate_chars(strategy.description(), DATA_SOURCE_DESCRIPTION_LIMIT),
        })
        .collect()
}

fn resolve_mitigations(query: &GraphQuery, technique_id: &str) -> Vec<MitigationRef> {
    query
        .mitigations_of(technique_id)
        .into_iter()
        .filter(|entity| entity.kind() == EntityKind::Mitigation)
        .map(|entity| MitigationRef {
            id: entity.id().to_string(),
            name: entity.name().to_string(),
            description: entity.description().to_string(),
            version: entity.version().to_string(),
            deprecated: entity.deprecated(),
            domains: entity.domains().to_vec(),
            external_references: entity.external_references().to_vec(),
            created: entity.created().to_string(),
            modified: entity.modified().to_string(),
        })
        .collect()
}

fn resolve_software(query: &GraphQuery, technique_id: &str) -> Vec<SoftwareRef> {
    query
        .software_using(technique_id)
        .into_iter()
        .map(|entity| SoftwareRef {
            id: entity.id().to_string(),
            external_id: entity.attack_id().map(str::to_string),
            name: entity.name().to_string(),
            software_type: entity.raw().object_type.clone(),
            description: entity.description().to_string(),
            platforms: entity.platforms().to_vec(),
            version: entity.version().to_string(),
            deprecated: entity.deprecated(),
            domains: entity.domains().to_vec(),
            external_references: entity.external_references().to_vec(),
            created: entity.created().to_string(),
            modified: entity.modified().to_string(),
            revoked: entity.revoked(),
        })
        .collect()
}

/// The technique's own references, minus the ATT&CK entry that carries
/// its id.
fn resolve_references(technique: &Entity) -> Vec<Reference> {
    technique
        .external_references()
        .iter()
        .filter(|reference| reference.source_name != "mitre-attack")
        .map(|reference| Reference {
            source: reference.source_name.clone(),
            url: reference.url.clone().unwrap_or_default(),
            description: reference.description.clone().unwrap_or_default(),
        })
        .collect()
}

fn resolve_subtechniques(query: &GraphQuery, technique_id: &str) -> Vec<TechniqueSummary> {
    query
        .subtechniques_of(technique_id)
        .into_iter()
        .filter(|entity| entity.kind() == EntityKind::Technique)
        .map(|sub| technique_summary(query, sub))
        .collect()
}

fn technique_summary(query: &GraphQuery, technique: &Entity) -> TechniqueSummary {
    TechniqueSummary {
        id: technique.attack_id().map(str::to_string),
        name: technique.name().to_string(),
        description: technique.description().to_string(),
        platforms: technique.platforms().to_vec(),
        tactics: resolve_tactics(query, technique.id()),
    }
}

/// Parent lookup is driven by the subtechnique flag, not the edge set:
/// a technique not flagged as a sub never reports a parent even if an
/// edge exists.
fn resolve_parent(query: &GraphQuery, technique: &Entity) -> Option<TechniqueSummary> {
    if !technique.is_subtechnique() {
        return None;
    }
    let parent = query.parent_of(technique.id())?;
    if parent.kind() != EntityKind::Technique {
        return None;
    }
    Some(technique_summary(query, parent))
}
