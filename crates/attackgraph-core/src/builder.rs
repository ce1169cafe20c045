//! Graph construction: two linear passes over bundle objects.
//!
//! Pass 1 indexes every object by id (last write wins for duplicate ids).
//! Pass 2 resolves relationship objects into typed edges; an edge whose
//! endpoint does not resolve is dropped, never an error. Construction must
//! finish before any query runs; the result is immutable afterwards.

use tracing::{debug, trace};

use crate::entity::{Entity, EntityKind, RelationKind};
use crate::graph::AttackGraph;
use crate::stix::{StixBundle, StixObject};

/// Build the graph from one or more bundles, in bundle order.
pub fn build_graph(bundles: &[StixBundle]) -> AttackGraph {
    let mut graph = AttackGraph::new();

    // Pass 1: index every object, relationship objects included. The id
    // index stays type-agnostic; queries filter by kind.
    for bundle in bundles {
        for obj in &bundle.objects {
            graph.insert_entity(Entity::new(obj.clone()));
        }
    }

    // Pass 2: turn relationship objects into edges.
    for bundle in bundles {
        for obj in &bundle.objects {
            index_relationship(&mut graph, obj);
        }
    }

    debug!(
        entities = graph.entity_count(),
        edges = graph.relations().edge_count(),
        children = graph.child_count(),
        "graph built"
    );
    graph
}

fn index_relationship(graph: &mut AttackGraph, obj: &StixObject) {
    if obj.object_type != "relationship" {
        return;
    }

    let (Some(source_ref), Some(target_ref)) = (&obj.source_ref, &obj.target_ref) else {
        trace!(id = %obj.id, "relationship missing an endpoint ref, skipped");
        return;
    };

    let kind = RelationKind::from_stix_type(obj.relationship_type.as_deref().unwrap_or(""));
    if kind == RelationKind::Unknown {
        return;
    }

    let (Some(source), Some(target)) = (graph.lookup(source_ref), graph.lookup(target_ref))
    else {
        trace!(id = %obj.id, kind = %kind, "dangling relationship endpoint, skipped");
        return;
    };

    graph.relations_mut().add_edge(source, kind, target);

    if kind == RelationKind::SubtechniqueOf
        && graph.entity(source).kind() == EntityKind::Technique
        && graph.entity(target).kind() == EntityKind::Technique
    {
        graph.mark_child(source);
    }
}
