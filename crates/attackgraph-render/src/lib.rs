//! Output rendering for the attack graph.
//!
//! Transforms a built graph into its two serialized views.
//!
//! # Module Structure
//!
//! - [`record`]: the comprehensive per-technique record model
//! - [`render`]: record fan-out over all techniques plus the nested
//!   knowledge base

pub mod record;
pub mod render;

pub use record::{
    DataSourceRef, MitigationRef, RecordMetadata, Reference, SoftwareRef, TacticRef,
    TechniqueRecord, TechniqueSummary, record_for, technique_record,
};
pub use render::{
    RenderReport, RenderedRecord, record_filename, render_nested, render_records,
};

/// Knobs for the record fan-out.
#[derive(Debug, Clone)]
pub struct RenderOption {
    /// Render techniques one at a time instead of fanning out over the
    /// thread pool. Both modes produce identical output.
    pub sequential: bool,
    /// Drop revoked and deprecated techniques before rendering.
    pub remove_revoked_deprecated: bool,
}

impl Default for RenderOption {
    fn default() -> Self {
        Self {
            sequential: false,
            remove_revoked_deprecated: true,
        }
    }
}

impl RenderOption {
    pub fn with_sequential(mut self, sequential: bool) -> Self {
        self.sequential = sequential;
        self
    }

    pub fn with_remove_revoked_deprecated(mut self, remove: bool) -> Self {
        self.remove_revoked_deprecated = remove;
        self
    }
}
