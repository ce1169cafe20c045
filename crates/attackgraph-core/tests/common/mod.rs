use attackgraph_core::{AttackGraph, StixBundle, StixObject, build_graph};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[allow(dead_code)]
pub fn with_graph<F>(objects: Vec<StixObject>, check: F)
where
    F: FnOnce(&AttackGraph),
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let graph = build_graph(&[StixBundle::from_objects(objects)]);
    check(&graph);
}

#[allow(dead_code)]
pub fn object(value: serde_json::Value) -> StixObject {
    serde_json::from_value(value).unwrap()
}

#[allow(dead_code)]
pub fn technique(stix_id: &str, attack_id: &str, name: &str, phases: &[&str]) -> StixObject {
    let kill_chain_phases: Vec<serde_json::Value> = phases
        .iter()
        .map(|phase| json!({"kill_chain_name": "mitre-attack", "phase_name": phase}))
        .collect();
    object(json!({
        "type": "attack-pattern",
        "id": stix_id,
        "name": name,
        "description": format!("{name} description."),
        "kill_chain_phases": kill_chain_phases,
        "x_mitre_platforms": ["Windows", "Linux"],
        "external_references": [
            {"source_name": "mitre-attack", "external_id": attack_id,
             "url": format!("https://attack.mitre.org/techniques/{attack_id}")}
        ]
    }))
}

#[allow(dead_code)]
pub fn subtechnique(stix_id: &str, attack_id: &str, name: &str, phases: &[&str]) -> StixObject {
    let mut sub = technique(stix_id, attack_id, name, phases);
    sub.x_mitre_is_subtechnique = Some(true);
    sub
}

#[allow(dead_code)]
pub fn tactic(stix_id: &str, attack_id: &str, name: &str, shortname: &str) -> StixObject {
    object(json!({
        "type": "x-mitre-tactic",
        "id": stix_id,
        "name": name,
        "description": format!("{name} tactic."),
        "x_mitre_shortname": shortname,
        "external_references": [
            {"source_name": "mitre-attack", "external_id": attack_id}
        ]
    }))
}

#[allow(dead_code)]
pub fn mitigation(stix_id: &str, attack_id: &str, name: &str) -> StixObject {
    object(json!({
        "type": "course-of-action",
        "id": stix_id,
        "name": name,
        "description": format!("{name} guidance."),
        "external_references": [
            {"source_name": "mitre-attack", "external_id": attack_id}
        ]
    }))
}

#[allow(dead_code)]
pub fn software(stix_type: &str, stix_id: &str, attack_id: &str, name: &str) -> StixObject {
    object(json!({
        "type": stix_type,
        "id": stix_id,
        "name": name,
        "description": format!("{name} profile."),
        "x_mitre_platforms": ["Windows"],
        "external_references": [
            {"source_name": "mitre-attack", "external_id": attack_id}
        ]
    }))
}

#[allow(dead_code)]
pub fn detection_strategy(stix_id: &str, attack_id: &str, name: &str) -> StixObject {
    object(json!({
        "type": "x-mitre-detection-strategy",
        "id": stix_id,
        "name": name,
        "description": format!("{name} analytic."),
        "external_references": [
            {"source_name": "mitre-attack", "external_id": attack_id}
        ]
    }))
}

#[allow(dead_code)]
pub fn relationship(rtype: &str, source: &str, target: &str) -> StixObject {
    object(json!({
        "type": "relationship",
        "id": format!("relationship--{rtype}--{source}--{target}"),
        "relationship_type": rtype,
        "source_ref": source,
        "target_ref": target,
    }))
}
