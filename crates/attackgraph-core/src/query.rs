//! Traversal queries over a built graph.
//!
//! Every query takes a STIX id and resolves to entities, never raw ids.
//! Results are deduplicated by id with input order otherwise preserved.
//! All queries are pure reads; a [`GraphQuery`] can be shared freely
//! across threads once the graph is built.

use std::collections::HashSet;

use crate::entity::{Entity, EntityKind, RelationKind};
use crate::graph::AttackGraph;

/// Read-only query handle over an [`AttackGraph`].
#[derive(Debug, Clone, Copy)]
pub struct GraphQuery<'g> {
    graph: &'g AttackGraph,
}

impl<'g> GraphQuery<'g> {
    pub fn new(graph: &'g AttackGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &'g AttackGraph {
        self.graph
    }

    /// Tactics associated with a technique, resolved by matching each
    /// kill-chain phase name against the tactics' shortname attribute.
    /// Empty when the technique is unknown, has no phases, or no tactic
    /// matches.
    pub fn tactics_of(&self, technique_id: &str) -> Vec<&'g Entity> {
        let Some(technique) = self.graph.resolve(technique_id) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut tactics = Vec::new();
        for phase in technique.phase_names() {
            if let Some(tactic) = self.graph.tactic_by_shortname(phase)
                && seen.insert(tactic.id())
            {
                tactics.push(tactic);
            }
        }
        tactics
    }

    /// Entities mitigating a technique, via "mitigates" edges targeting it.
    pub fn mitigations_of(&self, technique_id: &str) -> Vec<&'g Entity> {
        self.resolve_sources(technique_id, RelationKind::Mitigates, None)
    }

    /// Software and actor entities using a technique, via "uses" edges
    /// targeting it.
    pub fn software_using(&self, technique_id: &str) -> Vec<&'g Entity> {
        self.resolve_sources(technique_id, RelationKind::Uses, Some(EntityKind::Software))
    }

    /// Sub-techniques of a technique, via "subtechnique-of" edges
    /// targeting it.
    pub fn subtechniques_of(&self, technique_id: &str) -> Vec<&'g Entity> {
        self.resolve_sources(technique_id, RelationKind::SubtechniqueOf, None)
    }

    /// Detection strategies detecting a technique, via "detects" edges
    /// targeting it.
    pub fn detection_strategies_for(&self, technique_id: &str) -> Vec<&'g Entity> {
        self.resolve_sources(
            technique_id,
            RelationKind::Detects,
            Some(EntityKind::DetectionStrategy),
        )
    }

    /// The parent of a sub-technique: the target of its first
    /// "subtechnique-of" edge, None if it has none.
    pub fn parent_of(&self, subtechnique_id: &str) -> Option<&'g Entity> {
        let ix = self.graph.lookup(subtechnique_id)?;
        self.graph
            .relations()
            .first_target_of(ix, RelationKind::SubtechniqueOf)
            .map(|parent| self.graph.entity(parent))
    }

    /// The entity superseding a revoked technique: the target of its first
    /// "revoked-by" edge, None if it has none.
    pub fn revocation_target_of(&self, technique_id: &str) -> Option<&'g Entity> {
        let ix = self.graph.lookup(technique_id)?;
        self.graph
            .relations()
            .first_target_of(ix, RelationKind::RevokedBy)
            .map(|target| self.graph.entity(target))
    }

    /// All technique entities, in input order, one per id. Revoked and
    /// deprecated techniques are dropped when the flag is set.
    pub fn techniques(&self, remove_revoked_deprecated: bool) -> Vec<&'g Entity> {
        self.graph
            .entities_of_kind(EntityKind::Technique)
            .iter()
            .filter(|&&ix| self.graph.is_canonical(ix))
            .map(|&ix| self.graph.entity(ix))
            .filter(|e| !remove_revoked_deprecated || (!e.revoked() && !e.deprecated()))
            .collect()
    }

    /// Sources of edges of `kind` arriving at `id`, resolved and deduped
    /// by id, optionally filtered to one entity kind.
    fn resolve_sources(
        &self,
        id: &str,
        kind: RelationKind,
        want: Option<EntityKind>,
    ) -> Vec<&'g Entity> {
        let Some(ix) = self.graph.lookup(id) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut resolved = Vec::new();
        for &source in self.graph.relations().sources_of(ix, kind) {
            let entity = self.graph.entity(source);
            if let Some(want) = want
                && entity.kind() != want
            {
                continue;
            }
            if seen.insert(entity.id()) {
                resolved.push(entity);
            }
        }
        resolved
    }
}
