//! Hierarchy reshaper: projects the technique graph into a nested forest.
//!
//! Sub-techniques are embedded by owned copy inside their parent's record,
//! "uses"/"mitigates" edges become short-form references, and "revoked-by"
//! edges become an external-id mapping. Only techniques carrying an ATT&CK
//! id participate; the id is the user-facing key and sort contract.
//!
//! The transform never fails: dangling edges are dropped, a technique
//! claiming several parents keeps the first one seen, and cyclic
//! subtechnique chains are severed before roots are chosen so no
//! technique vanishes from the output.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::entity::{EntityIx, EntityKind, RelationKind};
use crate::graph::AttackGraph;

static CITATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(Citation:.*?\)").expect("citation pattern compiles"));

/// Strip `(Citation: ...)` markers and surrounding whitespace from a
/// description.
pub fn scrub_citations(text: &str) -> String {
    CITATION_RE.replace_all(text, "").trim().to_string()
}

/// One technique in the nested knowledge base.
///
/// Root records hoist their id to the mapping key and serialize without
/// the `id` field; embedded sub-techniques keep it. Field order is the
/// serialization contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedTechnique {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    /// Kill-chain phase names, not resolved tactic objects.
    pub tactics: Vec<String>,
    pub platforms: Vec<String>,
    pub revoked: bool,
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_by: Option<String>,
    /// Short references, "ID (Name)".
    pub software: Vec<String>,
    pub mitigations: Vec<String>,
    pub sub_techniques: Vec<NestedTechnique>,
}

/// The nested knowledge base: ATT&CK id -> technique record, keys sorted
/// ascending.
pub type NestedKb = BTreeMap<String, NestedTechnique>;

/// Reshape the graph into the nested knowledge base.
pub fn reshape(graph: &AttackGraph) -> NestedKb {
    // Techniques that participate: canonical and carrying an ATT&CK id.
    let mut techniques: Vec<EntityIx> = Vec::new();
    let mut tech_set: HashSet<EntityIx> = HashSet::new();
    for &ix in graph.entities_of_kind(EntityKind::Technique) {
        if graph.is_canonical(ix) && graph.entity(ix).attack_id().is_some() {
            techniques.push(ix);
            tech_set.insert(ix);
        }
    }

    let parent = assign_parents(graph, &techniques, &tech_set);

    let mut records: HashMap<EntityIx, NestedTechnique> = techniques
        .iter()
        .map(|&ix| (ix, base_record(graph, ix)))
        .collect();
    resolve_short_refs(graph, &techniques, &mut records);
    resolve_revocations(graph, &techniques, &tech_set, &mut records);

    let mut children: HashMap<EntityIx, Vec<EntityIx>> = HashMap::new();
    for &ix in &techniques {
        if let Some(&p) = parent.get(&ix) {
            children.entry(p).or_default().push(ix);
        }
    }

    let mut kb = NestedKb::new();
    for &ix in &techniques {
        if parent.contains_key(&ix) {
            continue;
        }
        let mut record = assemble(ix, &records, &children);
        if let Some(key) = record.id.take() {
            kb.insert(key, record);
        }
    }
    kb
}

/// First-seen parent per technique, then cycle severing.
///
/// Severing runs before root selection: a technique whose parent link
/// closed a cycle becomes a root instead of silently disappearing.
fn assign_parents(
    graph: &AttackGraph,
    techniques: &[EntityIx],
    tech_set: &HashSet<EntityIx>,
) -> HashMap<EntityIx, EntityIx> {
    let mut parent: HashMap<EntityIx, EntityIx> = HashMap::new();
    for &ix in techniques {
        let mut assigned: Option<EntityIx> = None;
        for &candidate in graph
            .relations()
            .targets_of(ix, RelationKind::SubtechniqueOf)
        {
            if !tech_set.contains(&candidate) {
                continue;
            }
            match assigned {
                None => assigned = Some(candidate),
                Some(first) if first != candidate => {
                    warn!(
                        technique = graph.entity(ix).id(),
                        kept = graph.entity(first).id(),
                        dropped = graph.entity(candidate).id(),
                        "technique claims multiple parents, keeping the first"
                    );
                }
                Some(_) => {}
            }
        }
        if let Some(p) = assigned {
            parent.insert(ix, p);
        }
    }

    let mut acyclic: HashSet<EntityIx> = HashSet::new();
    for &start in techniques {
        if acyclic.contains(&start) {
            continue;
        }
        let mut path: Vec<EntityIx> = Vec::new();
        let mut on_path: HashSet<EntityIx> = HashSet::new();
        let mut current = start;
        loop {
            if acyclic.contains(&current) {
                break;
            }
            if !on_path.insert(current) {
                // `current` closes a cycle; every node on the path now
                // terminates once its link is cut.
                if let Some(p) = parent.remove(&current) {
                    warn!(
                        technique = graph.entity(current).id(),
                        parent = graph.entity(p).id(),
                        "cyclic subtechnique chain, dropping edge"
                    );
                }
                break;
            }
            path.push(current);
            match parent.get(&current) {
                Some(&p) => current = p,
                None => break,
            }
        }
        acyclic.extend(path);
    }

    parent
}

fn base_record(graph: &AttackGraph, ix: EntityIx) -> NestedTechnique {
    let entity = graph.entity(ix);
    NestedTechnique {
        id: entity.attack_id().map(str::to_string),
        name: entity.name().to_string(),
        description: scrub_citations(entity.description()),
        tactics: entity.phase_names().map(str::to_string).collect(),
        platforms: entity.platforms().to_vec(),
        revoked: entity.revoked(),
        deprecated: entity.deprecated(),
        revoked_by: None,
        software: Vec::new(),
        mitigations: Vec::new(),
        sub_techniques: Vec::new(),
    }
}

/// Append "ID (Name)" references for "uses" and "mitigates" edges,
/// deduplicated, in edge order. Sources without an ATT&CK id are skipped.
fn resolve_short_refs(
    graph: &AttackGraph,
    techniques: &[EntityIx],
    records: &mut HashMap<EntityIx, NestedTechnique>,
) {
    for &ix in techniques {
        let Some(record) = records.get_mut(&ix) else {
            continue;
        };
        for &source in graph.relations().sources_of(ix, RelationKind::Uses) {
            let entity = graph.entity(source);
            if entity.kind() != EntityKind::Software {
                continue;
            }
            let Some(attack_id) = entity.attack_id() else {
                continue;
            };
            let short = format!("{} ({})", attack_id, entity.name());
            if !record.software.contains(&short) {
                record.software.push(short);
            }
        }
        for &source in graph.relations().sources_of(ix, RelationKind::Mitigates) {
            let entity = graph.entity(source);
            if entity.kind() != EntityKind::Mitigation {
                continue;
            }
            let Some(attack_id) = entity.attack_id() else {
                continue;
            };
            let short = format!("{} ({})", attack_id, entity.name());
            if !record.mitigations.contains(&short) {
                record.mitigations.push(short);
            }
        }
    }
}

/// Map each revoked technique to the ATT&CK id of its successor. The
/// first "revoked-by" edge whose target is a participating technique
/// wins.
fn resolve_revocations(
    graph: &AttackGraph,
    techniques: &[EntityIx],
    tech_set: &HashSet<EntityIx>,
    records: &mut HashMap<EntityIx, NestedTechnique>,
) {
    for &ix in techniques {
        let Some(record) = records.get_mut(&ix) else {
            continue;
        };
        for &target in graph.relations().targets_of(ix, RelationKind::RevokedBy) {
            if !tech_set.contains(&target) {
                continue;
            }
            record.revoked_by = graph.entity(target).attack_id().map(str::to_string);
            break;
        }
    }
}

/// Clone a technique's record with its sub-tree embedded, sorted by id at
/// every level. Depth is unbounded in principle, so recursion grows the
/// stack instead of trusting the one-level shape of real data.
fn assemble(
    ix: EntityIx,
    records: &HashMap<EntityIx, NestedTechnique>,
    children: &HashMap<EntityIx, Vec<EntityIx>>,
) -> NestedTechnique {
    let mut record = records[&ix].clone();
    if let Some(child_ixs) = children.get(&ix) {
        let mut subs: Vec<NestedTechnique> = child_ixs
            .iter()
            .map(|&child| {
                stacker::maybe_grow(64 * 1024, 1024 * 1024, || {
                    assemble(child, records, children)
                })
            })
            .collect();
        subs.sort_by(|a, b| a.id.cmp(&b.id));
        record.sub_techniques = subs;
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_graph;
    use crate::stix::{StixBundle, StixObject};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn obj(value: serde_json::Value) -> StixObject {
        serde_json::from_value(value).unwrap()
    }

    fn technique(stix_id: &str, attack_id: &str, name: &str) -> StixObject {
        obj(json!({
            "type": "attack-pattern",
            "id": stix_id,
            "name": name,
            "external_references": [
                {"source_name": "mitre-attack", "external_id": attack_id}
            ]
        }))
    }

    fn rel(rtype: &str, source: &str, target: &str) -> StixObject {
        obj(json!({
            "type": "relationship",
            "id": format!("relationship--{rtype}-{source}-{target}"),
            "relationship_type": rtype,
            "source_ref": source,
            "target_ref": target,
        }))
    }

    #[test]
    fn test_scrub_citations() {
        assert_eq!(
            scrub_citations("Adversaries act. (Citation: Report 2019) More text."),
            "Adversaries act.  More text."
        );
        assert_eq!(scrub_citations("(Citation: Only)"), "");
        assert_eq!(scrub_citations("  plain  "), "plain");
        assert_eq!(
            scrub_citations("a (Citation: One) b (Citation: Two) c"),
            "a  b  c"
        );
    }

    #[test]
    fn test_sub_nested_under_parent() {
        let graph = build_graph(&[StixBundle::from_objects(vec![
            technique("attack-pattern--parent", "T1059", "Command Line"),
            technique("attack-pattern--sub", "T1059.001", "PowerShell"),
            rel(
                "subtechnique-of",
                "attack-pattern--sub",
                "attack-pattern--parent",
            ),
        ])]);

        let kb = reshape(&graph);
        assert_eq!(kb.len(), 1);
        let parent = &kb["T1059"];
        assert!(parent.id.is_none());
        assert_eq!(parent.sub_techniques.len(), 1);
        assert_eq!(parent.sub_techniques[0].id.as_deref(), Some("T1059.001"));
        assert!(!kb.contains_key("T1059.001"));
    }

    #[test]
    fn test_duplicate_sub_edge_embeds_once() {
        let graph = build_graph(&[StixBundle::from_objects(vec![
            technique("attack-pattern--parent", "T1059", "Command Line"),
            technique("attack-pattern--sub", "T1059.001", "PowerShell"),
            rel(
                "subtechnique-of",
                "attack-pattern--sub",
                "attack-pattern--parent",
            ),
            rel(
                "subtechnique-of",
                "attack-pattern--sub",
                "attack-pattern--parent",
            ),
        ])]);

        let kb = reshape(&graph);
        assert_eq!(kb["T1059"].sub_techniques.len(), 1);
    }

    #[test]
    fn test_ambiguous_parent_first_edge_wins() {
        let graph = build_graph(&[StixBundle::from_objects(vec![
            technique("attack-pattern--a", "T1001", "First Parent"),
            technique("attack-pattern--b", "T1002", "Second Parent"),
            technique("attack-pattern--sub", "T1001.001", "Child"),
            rel(
                "subtechnique-of",
                "attack-pattern--sub",
                "attack-pattern--a",
            ),
            rel(
                "subtechnique-of",
                "attack-pattern--sub",
                "attack-pattern--b",
            ),
        ])]);

        let kb = reshape(&graph);
        assert_eq!(kb["T1001"].sub_techniques.len(), 1);
        assert!(kb["T1002"].sub_techniques.is_empty());
    }

    #[test]
    fn test_cycle_severed_nothing_lost() {
        let graph = build_graph(&[StixBundle::from_objects(vec![
            technique("attack-pattern--a", "T1001", "Alpha"),
            technique("attack-pattern--b", "T1002", "Beta"),
            rel("subtechnique-of", "attack-pattern--a", "attack-pattern--b"),
            rel("subtechnique-of", "attack-pattern--b", "attack-pattern--a"),
        ])]);

        let kb = reshape(&graph);
        // One consistent resolution: the severed technique surfaces as a
        // root carrying the other; both ids survive.
        let mut ids: Vec<&str> = Vec::new();
        for (key, root) in &kb {
            ids.push(key);
            for sub in &root.sub_techniques {
                ids.push(sub.id.as_deref().unwrap());
            }
        }
        ids.sort_unstable();
        assert_eq!(ids, vec!["T1001", "T1002"]);
    }

    #[test]
    fn test_self_loop_becomes_root() {
        let graph = build_graph(&[StixBundle::from_objects(vec![
            technique("attack-pattern--a", "T1001", "Alpha"),
            rel("subtechnique-of", "attack-pattern--a", "attack-pattern--a"),
        ])]);

        let kb = reshape(&graph);
        assert_eq!(kb.len(), 1);
        assert!(kb["T1001"].sub_techniques.is_empty());
    }

    #[test]
    fn test_technique_without_attack_id_excluded() {
        let graph = build_graph(&[StixBundle::from_objects(vec![
            technique("attack-pattern--a", "T1001", "Alpha"),
            obj(json!({
                "type": "attack-pattern",
                "id": "attack-pattern--no-id",
                "name": "Anonymous"
            })),
        ])]);

        let kb = reshape(&graph);
        assert_eq!(kb.len(), 1);
        assert!(kb.contains_key("T1001"));
    }

    #[test]
    fn test_short_refs_and_revocation() {
        let graph = build_graph(&[StixBundle::from_objects(vec![
            technique("attack-pattern--t", "T1001", "Alpha"),
            technique("attack-pattern--new", "T2000", "Fresh"),
            obj(json!({
                "type": "malware",
                "id": "malware--s",
                "name": "Emotet",
                "external_references": [
                    {"source_name": "mitre-attack", "external_id": "S0367"}
                ]
            })),
            obj(json!({
                "type": "course-of-action",
                "id": "course-of-action--m",
                "name": "Filtering",
                "external_references": [
                    {"source_name": "mitre-attack", "external_id": "M1037"}
                ]
            })),
            rel("uses", "malware--s", "attack-pattern--t"),
            rel("uses", "malware--s", "attack-pattern--t"),
            rel("mitigates", "course-of-action--m", "attack-pattern--t"),
            rel("revoked-by", "attack-pattern--t", "attack-pattern--new"),
        ])]);

        let kb = reshape(&graph);
        let alpha = &kb["T1001"];
        assert_eq!(alpha.software, vec!["S0367 (Emotet)"]);
        assert_eq!(alpha.mitigations, vec!["M1037 (Filtering)"]);
        assert_eq!(alpha.revoked_by.as_deref(), Some("T2000"));
        assert!(kb["T2000"].revoked_by.is_none());
    }

    #[test]
    fn test_root_serialization_shape() {
        let graph = build_graph(&[StixBundle::from_objects(vec![
            technique("attack-pattern--parent", "T1059", "Command Line"),
            technique("attack-pattern--sub", "T1059.001", "PowerShell"),
            rel(
                "subtechnique-of",
                "attack-pattern--sub",
                "attack-pattern--parent",
            ),
        ])]);

        let kb = reshape(&graph);
        let value = serde_json::to_value(&kb).unwrap();
        let root = &value["T1059"];
        assert!(root.get("id").is_none());
        assert!(root.get("revoked_by").is_none());
        assert_eq!(root["sub_techniques"][0]["id"], "T1059.001");
        assert_eq!(root["revoked"], false);
    }
}
