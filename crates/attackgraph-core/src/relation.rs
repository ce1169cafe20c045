//! Edge index over typed relationships.
//!
//! Both directions of every edge are recorded so "edges whose target is X"
//! is as cheap as "edges whose source is X". Insertion order is preserved
//! and duplicates are kept as-is; deduplication happens at the point of
//! use, where the caller knows which identity matters.

use std::collections::HashMap;

use crate::entity::{EntityIx, RelationKind};

/// Manages typed edges between entities, indexed from both endpoints.
#[derive(Debug, Default, Clone)]
pub struct RelationMap {
    /// source -> (kind -> targets), in insertion order
    forward: HashMap<EntityIx, HashMap<RelationKind, Vec<EntityIx>>>,
    /// target -> (kind -> sources), in insertion order
    reverse: HashMap<EntityIx, HashMap<RelationKind, Vec<EntityIx>>>,
    edge_count: usize,
}

impl RelationMap {
    /// Record one directed edge. Duplicate triples are kept.
    pub fn add_edge(&mut self, source: EntityIx, kind: RelationKind, target: EntityIx) {
        self.forward
            .entry(source)
            .or_default()
            .entry(kind)
            .or_default()
            .push(target);
        self.reverse
            .entry(target)
            .or_default()
            .entry(kind)
            .or_default()
            .push(source);
        self.edge_count += 1;
    }

    /// Targets of edges of `kind` leaving `source`, in insertion order.
    pub fn targets_of(&self, source: EntityIx, kind: RelationKind) -> &[EntityIx] {
        self.forward
            .get(&source)
            .and_then(|by_kind| by_kind.get(&kind))
            .map(|targets| targets.as_slice())
            .unwrap_or(&[])
    }

    /// Sources of edges of `kind` arriving at `target`, in insertion order.
    pub fn sources_of(&self, target: EntityIx, kind: RelationKind) -> &[EntityIx] {
        self.reverse
            .get(&target)
            .and_then(|by_kind| by_kind.get(&kind))
            .map(|sources| sources.as_slice())
            .unwrap_or(&[])
    }

    /// First target of `kind` leaving `source`, for at-most-one relations.
    pub fn first_target_of(&self, source: EntityIx, kind: RelationKind) -> Option<EntityIx> {
        self.targets_of(source, kind).first().copied()
    }

    /// Check whether a specific edge exists.
    pub fn has_edge(&self, source: EntityIx, kind: RelationKind, target: EntityIx) -> bool {
        self.targets_of(source, kind).contains(&target)
    }

    /// Number of edges recorded (duplicates included).
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Number of entities that are the source of at least one edge.
    pub fn source_count(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Get statistics about the recorded edges
    pub fn stats(&self) -> RelationStats {
        let mut by_kind: HashMap<RelationKind, usize> = HashMap::new();
        for by_kind_map in self.forward.values() {
            for (&kind, targets) in by_kind_map.iter() {
                *by_kind.entry(kind).or_insert(0) += targets.len();
            }
        }

        RelationStats {
            total_sources: self.forward.len(),
            total_edges: self.edge_count,
            by_kind,
        }
    }
}

/// Statistics about edges in the map
#[derive(Debug, Default, Clone)]
pub struct RelationStats {
    pub total_sources: usize,
    pub total_edges: usize,
    pub by_kind: HashMap<RelationKind, usize>,
}

impl std::fmt::Display for RelationStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Relation Stats:")?;
        writeln!(f, "  Total entities with edges: {}", self.total_sources)?;
        writeln!(f, "  Total edges: {}", self.total_edges)?;
        writeln!(f, "  By type:")?;
        for (&kind, &count) in &self.by_kind {
            writeln!(f, "    {}: {}", kind, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_directions() {
        let mut map = RelationMap::default();
        map.add_edge(EntityIx(1), RelationKind::Mitigates, EntityIx(2));

        assert_eq!(
            map.targets_of(EntityIx(1), RelationKind::Mitigates),
            &[EntityIx(2)]
        );
        assert_eq!(
            map.sources_of(EntityIx(2), RelationKind::Mitigates),
            &[EntityIx(1)]
        );
        assert!(map.targets_of(EntityIx(2), RelationKind::Mitigates).is_empty());
    }

    #[test]
    fn test_duplicates_kept() {
        let mut map = RelationMap::default();
        map.add_edge(EntityIx(1), RelationKind::Uses, EntityIx(2));
        map.add_edge(EntityIx(1), RelationKind::Uses, EntityIx(2));

        assert_eq!(map.targets_of(EntityIx(1), RelationKind::Uses).len(), 2);
        assert_eq!(map.edge_count(), 2);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut map = RelationMap::default();
        map.add_edge(EntityIx(5), RelationKind::SubtechniqueOf, EntityIx(9));
        map.add_edge(EntityIx(5), RelationKind::SubtechniqueOf, EntityIx(3));
        map.add_edge(EntityIx(5), RelationKind::SubtechniqueOf, EntityIx(7));

        assert_eq!(
            map.targets_of(EntityIx(5), RelationKind::SubtechniqueOf),
            &[EntityIx(9), EntityIx(3), EntityIx(7)]
        );
        assert_eq!(
            map.first_target_of(EntityIx(5), RelationKind::SubtechniqueOf),
            Some(EntityIx(9))
        );
    }

    #[test]
    fn test_kinds_kept_separate() {
        let mut map = RelationMap::default();
        map.add_edge(EntityIx(1), RelationKind::Uses, EntityIx(2));
        map.add_edge(EntityIx(1), RelationKind::Mitigates, EntityIx(3));

        assert!(map.has_edge(EntityIx(1), RelationKind::Uses, EntityIx(2)));
        assert!(!map.has_edge(EntityIx(1), RelationKind::Uses, EntityIx(3)));
        assert_eq!(
            map.targets_of(EntityIx(1), RelationKind::Mitigates),
            &[EntityIx(3)]
        );
    }

    #[test]
    fn test_stats() {
        let mut map = RelationMap::default();
        map.add_edge(EntityIx(1), RelationKind::Uses, EntityIx(2));
        map.add_edge(EntityIx(1), RelationKind::Uses, EntityIx(3));
        map.add_edge(EntityIx(4), RelationKind::RevokedBy, EntityIx(5));

        let stats = map.stats();
        assert_eq!(stats.total_sources, 2);
        assert_eq!(stats.total_edges, 3);
        assert_eq!(stats.by_kind.get(&RelationKind::Uses), Some(&2));
        assert_eq!(stats.by_kind.get(&RelationKind::RevokedBy), Some(&1));

        let display = stats.to_string();
        assert!(display.contains("Total edges: 3"));
    }
}
