//! Fan-out rendering of technique records and the nested KB.
//!
//! Records render in parallel by default; a technique that fails is
//! reported and skipped, never aborting the batch. Output order is
//! fixed by ATT&CK id so the parallel and sequential paths agree.

use attackgraph_core::{AttackGraph, Entity, GraphQuery, reshape};
use attackgraph_error::{Error, Result};
use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::RenderOption;
use crate::record::technique_record;

/// Characters replaced with `_` in the name half of a record filename.
const FILENAME_UNSAFE: [char; 10] = [' ', '/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// One rendered technique record, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRecord {
    pub attack_id: String,
    pub filename: String,
    pub body: String,
}

/// Outcome of a record batch: what rendered and what was skipped.
#[derive(Debug, Default)]
pub struct RenderReport {
    pub records: Vec<RenderedRecord>,
    pub failures: Vec<Error>,
}

impl RenderReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Render a record for every canonical technique in the graph.
pub fn render_records(graph: &AttackGraph, option: &RenderOption) -> RenderReport {
    let query = GraphQuery::new(graph);
    let techniques = query.techniques(option.remove_revoked_deprecated);
    let total = techniques.len();

    let failures = Mutex::new(Vec::new());
    let render_one = |technique: &Entity| -> Option<RenderedRecord> {
        match render_record(graph, technique) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(stix_id = technique.id(), error = %err, "skipping technique");
                failures.lock().push(err);
                None
            }
        }
    };

    let mut records: Vec<RenderedRecord> = if option.sequential {
        techniques.into_iter().filter_map(render_one).collect()
    } else {
        techniques.into_par_iter().filter_map(render_one).collect()
    };
    records.sort_by(|a, b| a.attack_id.cmp(&b.attack_id));

    let failures = failures.into_inner();
    debug!(
        total,
        rendered = records.len(),
        failed = failures.len(),
        "rendered technique records"
    );
    RenderReport { records, failures }
}

fn render_record(graph: &AttackGraph, technique: &Entity) -> Result<RenderedRecord> {
    let record = technique_record(graph, technique)?;
    let body = serde_json::to_string_pretty(&record).map_err(|err| {
        Error::serialization_failed("technique record does not serialize")
            .with_operation("render_record")
            .with_context("technique_id", record.technique_id.clone())
            .set_source(err)
    })?;
    Ok(RenderedRecord {
        filename: record_filename(&record.technique_id, &record.name),
        attack_id: record.technique_id,
        body,
    })
}

/// Serialize the nested knowledge base compactly.
pub fn render_nested(graph: &AttackGraph) -> Result<String> {
    let kb = reshape(graph);
    serde_json::to_string(&kb).map_err(|err| {
        Error::serialization_failed("nested knowledge base does not serialize")
            .with_operation("render_nested")
            .set_source(err)
    })
}

/// The output filename for a technique record: id and name joined with
/// `_`, filesystem-hostile characters replaced.
pub fn record_filename(attack_id: &str, name: &str) -> String {
    let safe_id: String = attack_id
        .chars()
        .map(|c| if c == '.' || c == '/' { '_' } else { c })
        .collect();
    let safe_name: String = name
        .chars()
        .map(|c| if FILENAME_UNSAFE.contains(&c) { '_' } else { c })
        .collect();
    format!("{safe_id}_{safe_name}.txt")
}
