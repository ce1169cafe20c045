pub mod builder;
pub mod bundle;
pub mod entity;
pub mod graph;
pub mod query;
pub mod relation;
pub mod reshape;
pub mod stix;

pub use builder::build_graph;
pub use bundle::{bundle_from_path, bundle_from_slice};
pub use entity::{Entity, EntityIx, EntityKind, RelationKind};
pub use graph::AttackGraph;
pub use query::GraphQuery;
pub use relation::{RelationMap, RelationStats};
pub use reshape::{NestedKb, NestedTechnique, reshape, scrub_citations};
pub use stix::{ATTACK_SOURCE_NAMES, ExternalReference, KillChainPhase, StixBundle, StixObject};
