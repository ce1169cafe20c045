//! The resolved graph: entity table plus lookup indices.
//!
//! Built once by [`crate::builder::build_graph`], immutable afterwards.
//! Queries and the reshaper only ever read it, so sharing across threads
//! needs no locking.
//!
//! Rationale for data structure choices:
//! - Vec is the entity table; an `EntityIx` is a position in it
//! - HashMap for the id index (opaque STIX ids, O(1) lookup, last write wins)
//! - BTreeMap for the tactic shortname index for ordered iteration
//! - HashMap of Vec for the kind index (multiple entities per kind)

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::entity::{Entity, EntityIx, EntityKind};
use crate::relation::RelationMap;

#[derive(Debug, Default)]
pub struct AttackGraph {
    /// All entities, in input order. EntityIx indexes into this.
    entities: Vec<Entity>,

    /// STIX id -> entity. Later duplicate ids overwrite earlier ones.
    id_index: HashMap<String, EntityIx>,

    /// Tactic shortname (e.g. "defense-evasion") -> tactic entity.
    /// First tactic seen for a shortname wins.
    tactic_index: BTreeMap<String, EntityIx>,

    /// Entity kind -> entities of that kind, in input order.
    kind_index: HashMap<EntityKind, Vec<EntityIx>>,

    /// Typed edges, both directions.
    relations: RelationMap,

    /// Techniques that are the source of a subtechnique-of edge whose
    /// target is also a known technique.
    children: HashSet<EntityIx>,
}

impl AttackGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entity to the table and register it in all indices.
    pub(crate) fn insert_entity(&mut self, entity: Entity) -> EntityIx {
        let ix = EntityIx::new(self.entities.len() as u32);

        self.id_index.insert(entity.id().to_string(), ix);
        if entity.kind() == EntityKind::Tactic
            && let Some(shortname) = entity.shortname()
        {
            self.tactic_index.entry(shortname.to_string()).or_insert(ix);
        }
        self.kind_index.entry(entity.kind()).or_default().push(ix);

        self.entities.push(entity);
        ix
    }

    pub(crate) fn relations_mut(&mut self) -> &mut RelationMap {
        &mut self.relations
    }

    pub(crate) fn mark_child(&mut self, ix: EntityIx) {
        self.children.insert(ix);
    }

    /// Get an entity by index, returning None if out of range
    pub fn opt_entity(&self, ix: EntityIx) -> Option<&Entity> {
        self.entities.get(ix.as_usize())
    }

    /// Get an entity by index, panicking if out of range
    pub fn entity(&self, ix: EntityIx) -> &Entity {
        self.opt_entity(ix)
            .unwrap_or_else(|| panic!("entity not found: {}", ix))
    }

    /// Resolve a STIX id to its canonical index.
    pub fn lookup(&self, id: &str) -> Option<EntityIx> {
        self.id_index.get(id).copied()
    }

    /// Resolve a STIX id to its canonical entity.
    pub fn resolve(&self, id: &str) -> Option<&Entity> {
        self.lookup(id).map(|ix| self.entity(ix))
    }

    /// Resolve a kill-chain phase name to the tactic carrying that
    /// shortname.
    pub fn tactic_by_shortname(&self, shortname: &str) -> Option<&Entity> {
        self.tactic_index
            .get(shortname)
            .map(|&ix| self.entity(ix))
    }

    /// All entities of a kind, in input order. Includes superseded
    /// duplicates; see [`AttackGraph::is_canonical`].
    pub fn entities_of_kind(&self, kind: EntityKind) -> &[EntityIx] {
        self.kind_index
            .get(&kind)
            .map(|entries| entries.as_slice())
            .unwrap_or(&[])
    }

    /// Whether this index is the one the id index resolves to. False for
    /// an entity shadowed by a later duplicate id.
    pub fn is_canonical(&self, ix: EntityIx) -> bool {
        self.lookup(self.entity(ix).id()) == Some(ix)
    }

    /// Whether the technique is a sub-technique per the edge set.
    pub fn is_child(&self, ix: EntityIx) -> bool {
        self.children.contains(&ix)
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn relations(&self) -> &RelationMap {
        &self.relations
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate all entities with their indices, in input order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityIx, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (EntityIx::new(i as u32), e))
    }
}
